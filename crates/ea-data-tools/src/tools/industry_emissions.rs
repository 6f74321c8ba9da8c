//! get_industry_emissions: one industry on a date, or its whole series.

use async_trait::async_trait;
use ea_protocol::CallArg;
use serde_json::Value;

use super::{optional_text, required_text};
use crate::error::DataResult;
use crate::table::{format_date, parse_date};
use crate::types::{EmissionTool, OperationOutput, Param, ToolContext};

pub struct IndustryEmissions;

#[async_trait]
impl EmissionTool for IndustryEmissions {
    fn name(&self) -> &str {
        "get_industry_emissions"
    }

    fn description(&self) -> &str {
        "Emissions of one industry on a date, or over all dates when no date is given"
    }

    fn params(&self) -> &'static [Param] {
        const PARAMS: &[Param] = &[Param::required("industry"), Param::optional("date")];
        PARAMS
    }

    async fn execute(
        &self,
        args: &[CallArg],
        ctx: &ToolContext<'_>,
    ) -> DataResult<OperationOutput> {
        let industry = required_text(args, 0, "industry")?;
        let idx = ctx.table.require_industry(industry)?;

        if let Some(raw_date) = optional_text(args, 1) {
            let date = parse_date(raw_date)?;
            return Ok(OperationOutput::Table(ctx.table.select(date, &[idx])));
        }

        // Full series, oldest first: "YYYY-MM-DD: value"
        let items = ctx
            .table
            .series(idx)
            .into_iter()
            .map(|(date, value)| {
                let value = value.map_or_else(|| "n/a".to_string(), |n| n.to_string());
                Value::String(format!("{}: {value}", format_date(date)))
            })
            .collect();
        Ok(OperationOutput::List { items })
    }
}
