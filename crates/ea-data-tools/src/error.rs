//! Data store and operation error types.

use thiserror::Error;

/// Errors raised while loading the table or running an operation.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("missing '{0}' column")]
    MissingDateColumn(&'static str),

    #[error("parse error on line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("duplicate date {date} on line {line}")]
    DuplicateDate { date: String, line: u64 },

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("unknown industry: '{0}'")]
    UnknownIndustry(String),

    #[error("argument '{0}' must not be None")]
    MissingArgument(&'static str),

    #[error("render failed: {0}")]
    Render(String),
}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

/// Convenience alias for data store results.
pub type DataResult<T> = Result<T, DataError>;
