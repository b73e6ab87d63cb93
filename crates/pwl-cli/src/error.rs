// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use pwl_core::PwlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Pwl(#[from] PwlError),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {source}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },
    #[error("{0}")]
    InvalidInput(String),
}

impl CliError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    pub fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            context: context.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Pwl(err) => err.code(),
            Self::InvalidInput(_) => "invalid_input",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Csv { .. } => "csv_error",
        }
    }
}
