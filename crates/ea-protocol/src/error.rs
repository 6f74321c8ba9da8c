//! Extraction and syntax errors for generator output.

use thiserror::Error;

/// Failure to turn raw generator text into a call expression.
///
/// The first two variants are extraction failures (nothing usable
/// after the marker); the rest are syntax failures in the expression
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("identifier '{0}' not found in response")]
    MarkerMissing(&'static str),

    #[error("no function call found after identifier")]
    EmptyCall,

    #[error("missing '(' in call expression: {0}")]
    MissingOpenParen(String),

    #[error("missing ')' at end of call expression: {0}")]
    MissingCloseParen(String),

    #[error("invalid operation name: '{0}'")]
    InvalidName(String),

    #[error("unterminated quote in argument {position}")]
    UnterminatedQuote { position: usize },

    #[error("empty argument at position {position}")]
    EmptyArgument { position: usize },
}

impl CallError {
    /// True for failures that happened before any call text was isolated.
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::MarkerMissing(_) | Self::EmptyCall)
    }
}

/// Convenience alias for call extraction/parsing results.
pub type CallResult<T> = Result<T, CallError>;
