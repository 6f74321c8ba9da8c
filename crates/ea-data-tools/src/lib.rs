//! Emissions data store and query operations.
//!
//! Provides the read-only `EmissionTable` (loaded once from CSV), a
//! `TrendRenderer` abstraction for plots, and the four operations the
//! assistant can dispatch: get_emissions_by_date, get_industry_emissions,
//! compare_industries, plot_trend.

pub mod error;
pub mod mock;
pub mod render;
pub mod table;
pub mod tools;
pub mod types;

pub use error::{DataError, DataResult};
pub use mock::{MockRenderer, sample_table};
pub use render::{SvgTrendRenderer, TrendPoint, TrendRenderer};
pub use table::{DATE_COLUMN, EmissionRecord, EmissionTable};
pub use types::{EmissionTool, OperationOutput, Param, TableView, ToolContext};
