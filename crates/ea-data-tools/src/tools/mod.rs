//! The fixed set of emissions query operations.

mod compare_industries;
mod emissions_by_date;
mod industry_emissions;
mod plot_trend;

pub use compare_industries::CompareIndustries;
pub use emissions_by_date::EmissionsByDate;
pub use industry_emissions::IndustryEmissions;
pub use plot_trend::PlotTrend;

use ea_protocol::CallArg;

use crate::error::{DataError, DataResult};
use crate::types::EmissionTool;

/// Every operation, in the order they are presented to the generator.
pub fn all_tools() -> Vec<Box<dyn EmissionTool>> {
    vec![
        Box::new(EmissionsByDate),
        Box::new(IndustryEmissions),
        Box::new(CompareIndustries),
        Box::new(PlotTrend),
    ]
}

/// Positional text argument that must be present and not `None`.
fn required_text<'a>(args: &'a [CallArg], idx: usize, name: &'static str) -> DataResult<&'a str> {
    args.get(idx)
        .and_then(CallArg::as_text)
        .ok_or(DataError::MissingArgument(name))
}

/// Positional text argument that may be omitted or `None`.
fn optional_text(args: &[CallArg], idx: usize) -> Option<&str> {
    args.get(idx).and_then(CallArg::as_text)
}
