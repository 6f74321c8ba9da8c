//! get_emissions_by_date: every industry's value on one date.

use async_trait::async_trait;
use ea_protocol::CallArg;

use super::required_text;
use crate::error::DataResult;
use crate::table::parse_date;
use crate::types::{EmissionTool, OperationOutput, Param, ToolContext};

pub struct EmissionsByDate;

#[async_trait]
impl EmissionTool for EmissionsByDate {
    fn name(&self) -> &str {
        "get_emissions_by_date"
    }

    fn description(&self) -> &str {
        "Emissions of every industry on a specific date"
    }

    fn params(&self) -> &'static [Param] {
        const PARAMS: &[Param] = &[Param::required("date")];
        PARAMS
    }

    async fn execute(
        &self,
        args: &[CallArg],
        ctx: &ToolContext<'_>,
    ) -> DataResult<OperationOutput> {
        let date = parse_date(required_text(args, 0, "date")?)?;
        let view = ctx
            .table
            .select(date, &ctx.table.all_industry_indices());
        Ok(OperationOutput::Table(view))
    }
}
