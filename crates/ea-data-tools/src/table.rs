//! Read-only emissions table loaded from CSV.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde_json::{Number, Value};

use crate::error::{DataError, DataResult};
use crate::types::TableView;

/// Header of the date column. Every other column is an industry.
pub const DATE_COLUMN: &str = "Emission Date";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(s: &str) -> DataResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| DataError::InvalidDate(s.into()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One row: a date and one value per industry (aligned with
/// `EmissionTable::industries`). Empty cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRecord {
    pub date: NaiveDate,
    pub values: Vec<Option<Number>>,
}

/// Immutable in-memory table keyed by date.
///
/// Each date maps to at most one record. The industry set is whatever
/// the CSV header declares.
#[derive(Debug, Clone)]
pub struct EmissionTable {
    industries: Vec<String>,
    records: Vec<EmissionRecord>,
    by_date: HashMap<NaiveDate, usize>,
}

impl EmissionTable {
    /// Load from a CSV file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> DataResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
        Self::from_reader(file)
    }

    pub fn from_csv_str(csv_text: &str) -> DataResult<Self> {
        Self::from_reader(csv_text.as_bytes())
    }

    /// Load from any CSV byte stream with a header row.
    pub fn from_reader<R: Read>(reader: R) -> DataResult<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        let date_idx = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or(DataError::MissingDateColumn(DATE_COLUMN))?;
        let industry_cols: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx)
            .map(|(i, h)| (i, h.clone()))
            .collect();

        let mut records = Vec::new();
        let mut by_date = HashMap::new();

        for result in rdr.records() {
            let row = result?;
            let line = row.position().map_or(0, |p| p.line());

            let raw_date = row.get(date_idx).unwrap_or("");
            let date = parse_date(raw_date).map_err(|_| DataError::Parse {
                line,
                message: format!("invalid date '{raw_date}'"),
            })?;

            let values = industry_cols
                .iter()
                .map(|(i, name)| {
                    coerce_cell(row.get(*i).unwrap_or("")).ok_or_else(|| DataError::Parse {
                        line,
                        message: format!("non-numeric value in column '{name}'"),
                    })
                })
                .collect::<DataResult<Vec<_>>>()?;

            if by_date.insert(date, records.len()).is_some() {
                return Err(DataError::DuplicateDate {
                    date: format_date(date),
                    line,
                });
            }
            records.push(EmissionRecord { date, values });
        }

        tracing::info!(
            industries = industry_cols.len(),
            records = records.len(),
            "emissions table loaded"
        );

        Ok(Self {
            industries: industry_cols.into_iter().map(|(_, name)| name).collect(),
            records,
            by_date,
        })
    }

    pub fn industries(&self) -> &[String] {
        &self.industries
    }

    pub fn industry_index(&self, name: &str) -> Option<usize> {
        self.industries.iter().position(|i| i == name)
    }

    pub fn has_industry(&self, name: &str) -> bool {
        self.industry_index(name).is_some()
    }

    /// Like `industry_index`, but an unknown name is an error.
    pub fn require_industry(&self, name: &str) -> DataResult<usize> {
        self.industry_index(name)
            .ok_or_else(|| DataError::UnknownIndustry(name.to_string()))
    }

    pub fn record(&self, date: NaiveDate) -> Option<&EmissionRecord> {
        self.by_date.get(&date).map(|&i| &self.records[i])
    }

    /// Records in file order.
    pub fn records(&self) -> &[EmissionRecord] {
        &self.records
    }

    /// All `(date, value)` pairs for one industry, sorted by date.
    pub fn series(&self, industry: usize) -> Vec<(NaiveDate, Option<&Number>)> {
        let mut points: Vec<_> = self
            .records
            .iter()
            .map(|r| (r.date, r.values.get(industry).and_then(Option::as_ref)))
            .collect();
        points.sort_by_key(|(date, _)| *date);
        points
    }

    /// The row for `date` restricted to the given industry columns.
    /// Zero rows if the date is absent.
    pub fn select(&self, date: NaiveDate, industries: &[usize]) -> TableView {
        let mut columns = vec![DATE_COLUMN.to_string()];
        columns.extend(industries.iter().map(|&i| self.industries[i].clone()));

        let rows = self
            .record(date)
            .map(|record| {
                let mut row = vec![Value::String(format_date(record.date))];
                row.extend(
                    industries
                        .iter()
                        .map(|&i| cell_value(record.values.get(i).and_then(Option::as_ref))),
                );
                row
            })
            .into_iter()
            .collect();

        TableView { columns, rows }
    }

    /// Every industry column, in header order.
    pub fn all_industry_indices(&self) -> Vec<usize> {
        (0..self.industries.len()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub(crate) fn cell_value(cell: Option<&Number>) -> Value {
    cell.map_or(Value::Null, |n| Value::Number(n.clone()))
}

/// Empty → `Some(None)`, integer or float → `Some(Some(n))`, else `None`.
fn coerce_cell(s: &str) -> Option<Option<Number>> {
    let s = s.trim();
    if s.is_empty() {
        return Some(None);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Some(Number::from(i)));
    }
    let f = s.parse::<f64>().ok()?;
    Number::from_f64(f).map(Some)
}
