//! Inference and pipeline error types.

use ea_protocol::CallError;
use thiserror::Error;

/// Failures talking to the text-generation backend.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("backend returned an empty completion")]
    Empty,
}

pub type InferenceResult<T> = Result<T, InferenceError>;

/// Every way a query can fail, as seen by the presentation layer.
///
/// `Display` is the text shown to the user. An empty result is not an
/// error; it normalizes to a message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Error: the language model did not return a usable response ({0})")]
    Resolver(#[from] InferenceError),

    #[error("Error: could not find a function call in the model output: {0}")]
    Extraction(CallError),

    #[error("Error: malformed function call: {0}")]
    Syntax(CallError),

    #[error("Error: Function '{name}' not found.")]
    UnknownOperation { name: String },

    #[error("Error: {operation} expects {expected} argument(s), got {got}")]
    BadArity {
        operation: String,
        expected: String,
        got: usize,
    },

    #[error("Error executing function {operation}: {cause}")]
    Execution { operation: String, cause: String },
}

impl From<CallError> for PipelineError {
    fn from(e: CallError) -> Self {
        if e.is_extraction() {
            Self::Extraction(e)
        } else {
            Self::Syntax(e)
        }
    }
}

impl PipelineError {
    /// Stable tag for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolver(_) => "resolver",
            Self::Extraction(_) => "extraction",
            Self::Syntax(_) => "syntax",
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::BadArity { .. } => "bad_arity",
            Self::Execution { .. } => "execution",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_errors_split_by_stage() {
        let e: PipelineError = CallError::MarkerMissing("UUU_:").into();
        assert_eq!(e.kind(), "extraction");
        let e: PipelineError = CallError::MissingOpenParen("x".into()).into();
        assert_eq!(e.kind(), "syntax");
    }

    #[test]
    fn unknown_operation_names_offender() {
        let e = PipelineError::UnknownOperation {
            name: "unknown_op".into(),
        };
        assert_eq!(e.to_string(), "Error: Function 'unknown_op' not found.");
    }
}
