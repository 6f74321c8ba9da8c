//! Result normalizer: one mapping shape for every operation output.

use ea_data_tools::OperationOutput;
use ea_protocol::NormalizedResult;
use serde_json::Value;

/// Convert an operation's output into a [`NormalizedResult`].
///
/// Tables yield their first row (later rows are dropped), or the
/// "No data found" message when empty. Lists become a comma-joined
/// `data` string. Mappings pass through. Scalars and side effects become
/// a `message`.
pub fn normalize(output: &OperationOutput) -> NormalizedResult {
    match output {
        OperationOutput::Table(view) => view
            .first_row()
            .map_or_else(NormalizedResult::no_data, NormalizedResult::from_map),
        OperationOutput::List { items } => {
            let joined: Vec<String> = items.iter().map(display_value).collect();
            NormalizedResult::data(joined.join(", "))
        }
        OperationOutput::Mapping { fields } => NormalizedResult::from_map(fields.clone()),
        OperationOutput::Scalar { value } => NormalizedResult::message(display_value(value)),
        OperationOutput::SideEffect { description } => {
            NormalizedResult::message(description.clone())
        }
    }
}

/// Strings print bare; everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
