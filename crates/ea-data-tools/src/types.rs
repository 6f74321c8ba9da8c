//! Operation output shapes and the EmissionTool trait.

use async_trait::async_trait;
use ea_protocol::CallArg;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::DataResult;
use crate::render::TrendRenderer;
use crate::table::EmissionTable;

// ── Table View ────────────────────────────────────────────────

/// Rows selected from the table, restricted to a set of columns.
///
/// `columns[0]` is always the date column. Each row is aligned with
/// `columns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableView {
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row as a column → value mapping, in column order.
    pub fn first_row(&self) -> Option<Map<String, Value>> {
        let row = self.rows.first()?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        )
    }
}

// ── Operation Output ──────────────────────────────────────────

/// Every shape an operation can hand back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationOutput {
    /// Tabular rows (possibly none).
    Table(TableView),
    /// An ordered sequence of values.
    List { items: Vec<Value> },
    /// Already a key/value mapping.
    Mapping { fields: Map<String, Value> },
    /// A single value.
    Scalar { value: Value },
    /// The operation produced an artifact rather than data.
    SideEffect { description: String },
}

// ── Parameters ────────────────────────────────────────────────

/// One positional parameter of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub required: bool,
}

impl Param {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

/// Everything an operation may read or touch.
pub struct ToolContext<'a> {
    pub table: &'a EmissionTable,
    pub renderer: &'a dyn TrendRenderer,
}

// ── EmissionTool Trait ────────────────────────────────────────

/// A named, positional-argument query over the emissions table.
///
/// Argument count is checked by the caller against `params()` before
/// `execute` runs; values themselves are validated here.
#[async_trait]
pub trait EmissionTool: Send + Sync {
    /// Operation name (e.g., "get_emissions_by_date").
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Positional parameters; optional ones come last.
    fn params(&self) -> &'static [Param];

    /// Smallest and largest accepted argument count.
    fn arity(&self) -> (usize, usize) {
        let params = self.params();
        let min = params.iter().filter(|p| p.required).count();
        (min, params.len())
    }

    /// Human-readable signature, e.g. `get_industry_emissions(industry, date=None)`.
    fn signature(&self) -> String {
        let params: Vec<String> = self
            .params()
            .iter()
            .map(|p| {
                if p.required {
                    p.name.to_string()
                } else {
                    format!("{}=None", p.name)
                }
            })
            .collect();
        format!("{}({})", self.name(), params.join(", "))
    }

    async fn execute(&self, args: &[CallArg], ctx: &ToolContext<'_>)
    -> DataResult<OperationOutput>;
}
