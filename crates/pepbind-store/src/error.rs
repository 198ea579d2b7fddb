//! Persistence error types.

use std::path::PathBuf;

use thiserror::Error;

use pepbind_common::BindError;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Corrupt bind table {path} line {line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Bind table {0} is read-only")]
    ReadOnly(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<StoreError> for BindError {
    fn from(err: StoreError) -> Self {
        BindError::Store(err.to_string())
    }
}
