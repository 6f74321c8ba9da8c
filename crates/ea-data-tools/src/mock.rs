//! Test fixtures: a small emissions table and a recording renderer.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::DataResult;
use crate::render::{TrendPoint, TrendRenderer};
use crate::table::EmissionTable;

const SAMPLE_CSV: &str = "\
Emission Date,Production of cement clinker,Refining of mineral oil,Production of Pig iron or steel,Production of Hydrogen and synthesis gas
2021-03-06,790.25,1100,1010,298
2019-07-17,845.5,1200,980,310
2019-07-18,850,1185,,305
2021-03-04,802,1090,1025,301
2023-08-08,760.75,1050,990,280
";

/// A five-day table with four reference industries.
///
/// 2019-07-17 is fully populated; 2019-07-18 has no steel value;
/// 2021-03-05 is deliberately absent. Rows are not in date order.
pub fn sample_table() -> EmissionTable {
    EmissionTable::from_csv_str(SAMPLE_CSV).expect("sample CSV is valid")
}

/// Records render requests instead of writing files.
#[derive(Default)]
pub struct MockRenderer {
    calls: Mutex<Vec<(String, Vec<TrendPoint>)>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Industries rendered so far, in call order.
    pub fn rendered(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Points passed for the most recent render.
    pub fn last_points(&self) -> Option<Vec<TrendPoint>> {
        self.lock().last().map(|(_, points)| points.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Vec<TrendPoint>)>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TrendRenderer for MockRenderer {
    async fn render(&self, industry: &str, points: &[TrendPoint]) -> DataResult<String> {
        self.lock().push((industry.to_string(), points.to_vec()));
        Ok(format!("memory://{industry}"))
    }
}
