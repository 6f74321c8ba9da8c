//! Intent resolver: asks the text generator to pick one operation.
//!
//! The prompt is strict, but the reply is still untrusted text: it may
//! lack the marker, invent operations, or botch the date. Everything
//! downstream validates.

use std::fmt::Write as _;

use ea_protocol::MARKER;

use crate::error::InferenceResult;
use crate::inference::TextGenerator;
use crate::registry::OperationInfo;

/// Build the instruction prompt for one user query.
///
/// Operation signatures come from the registry and industry names from
/// the loaded table, so the prompt never drifts from what dispatch
/// accepts.
pub fn intent_prompt(query: &str, operations: &[OperationInfo], industries: &[String]) -> String {
    let mut functions = String::new();
    for (i, op) in operations.iter().enumerate() {
        let _ = writeln!(functions, "{}. {} - {}.", i + 1, op.signature, op.description);
    }

    let mut industry_list = String::new();
    for name in industries {
        let _ = writeln!(industry_list, "- {name}");
    }

    format!(
        r#"You translate questions about industry emissions data into exactly one function call.

STRICT INSTRUCTIONS
- Do NOT provide reasoning, explanations, or extra text.
- Do NOT analyze the query beyond choosing the function and its arguments.
- ONLY use a date that appears in the user query. NEVER invent a date.

AVAILABLE FUNCTIONS
{functions}
FUNCTION SELECTION RULES
- The query mentions only a date and asks for emissions -> get_emissions_by_date(date).
- The query mentions one specific industry -> get_industry_emissions(industry, date), with None when no date is given.
- The query mentions two industries and a comparison -> compare_industries(industry1, industry2, date).
- The query asks about a trend over time -> plot_trend(industry).
- NEVER assume an industry the query does not mention.

KNOWN INDUSTRIES (use these exact names)
{industry_list}
DATE RULES
- Convert every date to "YYYY-MM-DD".
  "July 17 2019" -> "2019-07-17"; "17/07/2019" -> "2019-07-17"; "08-08-2023" -> "2023-08-08".
- If the query mentions no date, pass None.

OUTPUT FORMAT
Start the response with the identifier {MARKER} followed immediately by the function call:
{MARKER} function_name("argument1", "argument2", ...)

EXAMPLES (do not copy their dates)
Query: "What were the emissions on July 17 2019?"
{MARKER} get_emissions_by_date("2019-07-17")

Query: "Compare Refining of mineral oil and Production of Pig iron or steel on March 5, 2021."
{MARKER} compare_industries("Refining of mineral oil", "Production of Pig iron or steel", "2021-03-05")

Query: "Give me the carbon emissions information for Hydrogen production."
{MARKER} get_industry_emissions("Production of Hydrogen and synthesis gas", None)

Query: "Show the trend of Cement production emissions."
{MARKER} plot_trend("Production of cement clinker")

USER QUERY
"{query}"
"#
    )
}

/// Send the intent prompt and return the raw completion.
pub async fn resolve(
    generator: &dyn TextGenerator,
    query: &str,
    operations: &[OperationInfo],
    industries: &[String],
) -> InferenceResult<String> {
    let prompt = intent_prompt(query, operations, industries);
    let raw = generator.generate(&prompt).await?;
    tracing::debug!(raw = %raw, "intent generator replied");
    Ok(raw)
}
