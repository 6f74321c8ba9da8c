//! compare_industries: two industries side by side on one date.

use async_trait::async_trait;
use ea_protocol::CallArg;

use super::required_text;
use crate::error::DataResult;
use crate::table::{DATE_COLUMN, parse_date};
use crate::types::{EmissionTool, OperationOutput, Param, TableView, ToolContext};

pub struct CompareIndustries;

#[async_trait]
impl EmissionTool for CompareIndustries {
    fn name(&self) -> &str {
        "compare_industries"
    }

    fn description(&self) -> &str {
        "Emissions of two industries on the same date"
    }

    fn params(&self) -> &'static [Param] {
        const PARAMS: &[Param] = &[
            Param::required("industry1"),
            Param::required("industry2"),
            Param::required("date"),
        ];
        PARAMS
    }

    /// An unknown industry or absent date yields an empty table rather
    /// than an error. A malformed date still fails.
    async fn execute(
        &self,
        args: &[CallArg],
        ctx: &ToolContext<'_>,
    ) -> DataResult<OperationOutput> {
        let first = required_text(args, 0, "industry1")?;
        let second = required_text(args, 1, "industry2")?;
        let date = parse_date(required_text(args, 2, "date")?)?;

        let view = match (ctx.table.industry_index(first), ctx.table.industry_index(second)) {
            (Some(a), Some(b)) => ctx.table.select(date, &[a, b]),
            _ => {
                tracing::debug!(first, second, "compare_industries: unknown industry");
                TableView::empty(vec![
                    DATE_COLUMN.to_string(),
                    first.to_string(),
                    second.to_string(),
                ])
            }
        };
        Ok(OperationOutput::Table(view))
    }
}
