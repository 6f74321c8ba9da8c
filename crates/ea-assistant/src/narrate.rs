//! Second-stage prompt: turn a normalized result into prose instructions.

use std::fmt::Write as _;

use ea_data_tools::DATE_COLUMN;
use ea_protocol::NormalizedResult;
use serde_json::{Number, Value};

use crate::error::PipelineError;

const RULES: &str = "\
You are an AI assistant presenting industry emissions data exactly as retrieved.

STRICT RULES
- DO NOT modify, fabricate, round, or mislabel any numbers.
- DO NOT introduce new industries. Use only the ones provided.
- DO NOT duplicate industries. Each industry appears only once.
- Ensure numbers match their respective industries exactly.
";

const INSIGHTS: &str = "\
INSIGHTS (after the table)
- Identify industries with significantly lower emissions.
- Highlight any abnormally high or low values with a possible explanation.
- Give a short conclusion based only on the retrieved data.
- Suggest a next step, such as comparing another date or industry.
";

/// Build the narrative prompt for a pipeline outcome.
pub fn narrative_prompt(outcome: &Result<NormalizedResult, PipelineError>) -> String {
    let mut prompt = String::from(RULES);
    prompt.push('\n');

    match outcome {
        Err(e) => {
            let _ = writeln!(
                prompt,
                "The data lookup failed with this error:\n{e}\n\n\
                 Explain the problem to the user in one or two sentences and suggest how to rephrase the question."
            );
        }
        Ok(result) => {
            if let Some(text) = result.message_text().or_else(|| result.data_text()) {
                let _ = writeln!(
                    prompt,
                    "The lookup returned:\n{text}\n\nPresent this to the user clearly."
                );
            } else {
                prompt.push_str(&emissions_table(result));
                prompt.push('\n');
            }
            prompt.push_str(INSIGHTS);
        }
    }
    prompt
}

/// Markdown table of numeric industry values plus the top emitter.
fn emissions_table(result: &NormalizedResult) -> String {
    let date = result
        .get(DATE_COLUMN)
        .and_then(Value::as_str)
        .unwrap_or("Unknown Date");

    let rows: Vec<(&str, &Number)> = result
        .iter()
        .filter(|(k, _)| k.as_str() != DATE_COLUMN)
        .filter_map(|(k, v)| v.as_number().map(|n| (k.as_str(), n)))
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "#### Industry Emissions on {date}");
    let _ = writeln!(out, "| Industry | Emission Value (Metric Tons) |");
    let _ = writeln!(out, "|----------|------------------------------|");
    for (industry, value) in &rows {
        let _ = writeln!(out, "| {industry} | {} |", group_thousands(value));
    }

    // First maximum wins on ties.
    let top = rows.iter().fold(None::<(&str, f64)>, |best, &(name, n)| {
        let v = n.as_f64().unwrap_or(f64::NEG_INFINITY);
        match best {
            Some((_, b)) if b >= v => best,
            _ => Some((name, v)),
        }
    });
    let _ = writeln!(
        out,
        "\nTop emitter: **{}** had the highest emissions.",
        top.map_or("No Data", |(name, _)| name)
    );
    out
}

/// `1234567.5` → `1,234,567.5`. Exponent forms are left alone.
fn group_thousands(n: &Number) -> String {
    let s = n.to_string();
    if s.contains(['e', 'E']) {
        return s;
    }
    let (sign, rest) = s.strip_prefix('-').map_or(("", s.as_str()), |r| ("-", r));
    let (int, frac) = rest.split_once('.').map_or((rest, None), |(i, f)| (i, Some(f)));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
