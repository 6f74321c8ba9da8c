//! Operation registry and dispatcher.
//!
//! The registry is the pipeline's trust boundary: it receives whatever
//! the parser made of the generator's text and either runs exactly one
//! known operation or reports why it would not.

use std::collections::HashMap;

use ea_data_tools::{EmissionTool, OperationOutput, ToolContext};
use ea_protocol::ParsedCall;

use crate::error::PipelineError;

/// Metadata about a registered operation (used for prompts and listings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInfo {
    pub name: String,
    pub description: String,
    pub signature: String,
}

/// Result of dispatching one parsed call.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Success(OperationOutput),
    UnknownOperation {
        name: String,
    },
    BadArity {
        operation: String,
        expected: String,
        got: usize,
    },
    ExecutionError {
        operation: String,
        cause: String,
    },
}

impl DispatchOutcome {
    pub fn into_result(self) -> Result<OperationOutput, PipelineError> {
        match self {
            Self::Success(output) => Ok(output),
            Self::UnknownOperation { name } => Err(PipelineError::UnknownOperation { name }),
            Self::BadArity {
                operation,
                expected,
                got,
            } => Err(PipelineError::BadArity {
                operation,
                expected,
                got,
            }),
            Self::ExecutionError { operation, cause } => {
                Err(PipelineError::Execution { operation, cause })
            }
        }
    }
}

/// Fixed set of operations, indexed by name for O(1) dispatch.
pub struct OperationRegistry {
    tools: Vec<Box<dyn EmissionTool>>,
    index: HashMap<String, usize>,
}

impl OperationRegistry {
    pub fn new(tools: Vec<Box<dyn EmissionTool>>) -> Self {
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, tool)| (tool.name().to_string(), i))
            .collect();
        Self { tools, index }
    }

    /// Build with the four emissions operations.
    pub fn with_defaults() -> Self {
        Self::new(ea_data_tools::tools::all_tools())
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn EmissionTool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Check the name and argument count, then run the operation.
    ///
    /// Nothing is invoked unless both checks pass. Operation errors come
    /// back as `ExecutionError` carrying the cause.
    pub async fn dispatch(&self, call: &ParsedCall, ctx: &ToolContext<'_>) -> DispatchOutcome {
        let Some(tool) = self.lookup(&call.name) else {
            tracing::warn!(operation = %call.name, "unknown operation");
            return DispatchOutcome::UnknownOperation {
                name: call.name.clone(),
            };
        };

        let (min, max) = tool.arity();
        let got = call.args.len();
        if got < min || got > max {
            tracing::warn!(operation = %call.name, got, min, max, "argument count mismatch");
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min} to {max}")
            };
            return DispatchOutcome::BadArity {
                operation: call.name.clone(),
                expected,
                got,
            };
        }

        match tool.execute(&call.args, ctx).await {
            Ok(output) => DispatchOutcome::Success(output),
            Err(e) => {
                tracing::warn!(operation = %call.name, error = %e, "operation failed");
                DispatchOutcome::ExecutionError {
                    operation: call.name.clone(),
                    cause: e.to_string(),
                }
            }
        }
    }

    /// All registered operations, in registration order.
    pub fn list_operations(&self) -> Vec<OperationInfo> {
        self.tools
            .iter()
            .map(|tool| OperationInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                signature: tool.signature(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
