//! Trend rendering: turns a date series into a chart artifact.

use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{DataError, DataResult};
use crate::table::format_date;

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Where plot_trend sends its series.
///
/// Returns a human-readable location of the produced artifact.
#[async_trait]
pub trait TrendRenderer: Send + Sync {
    async fn render(&self, industry: &str, points: &[TrendPoint]) -> DataResult<String>;
}

/// Writes an SVG line chart per industry into a directory.
pub struct SvgTrendRenderer {
    dir: PathBuf,
}

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 500.0;
const MARGIN: f64 = 60.0;

impl SvgTrendRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output path for an industry's chart.
    pub fn path_for(&self, industry: &str) -> PathBuf {
        self.dir.join(format!("{}_trend.svg", slug(industry)))
    }
}

#[async_trait]
impl TrendRenderer for SvgTrendRenderer {
    async fn render(&self, industry: &str, points: &[TrendPoint]) -> DataResult<String> {
        let path = self.path_for(industry);
        let svg = svg_chart(industry, points);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DataError::Render(format!("{}: {e}", self.dir.display())))?;
        tokio::fs::write(&path, svg)
            .await
            .map_err(|e| DataError::Render(format!("{}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), points = points.len(), "trend chart written");
        Ok(path.display().to_string())
    }
}

/// Lowercase alphanumerics, everything else collapsed to `_`.
fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "industry".into()
    } else {
        trimmed.into()
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render `points` (already sorted by date) as a standalone SVG document.
fn svg_chart(industry: &str, points: &[TrendPoint]) -> String {
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;

    let (min_v, max_v) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.value), hi.max(p.value))
        });
    let span_v = if max_v > min_v { max_v - min_v } else { 1.0 };
    let first = points.first().map(|p| p.date);
    let last = points.last().map(|p| p.date);
    let span_days = match (first, last) {
        (Some(a), Some(b)) if b > a => (b - a).num_days() as f64,
        _ => 1.0,
    };

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="30" text-anchor="middle" font-size="18">Trend of {} Emissions Over Time</text>"#,
        WIDTH / 2.0,
        escape_xml(industry)
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN}" y1="{y}" x2="{x}" y2="{y}" stroke="black"/><line x1="{MARGIN}" y1="{MARGIN}" x2="{MARGIN}" y2="{y}" stroke="black"/>"#,
        x = WIDTH - MARGIN,
        y = HEIGHT - MARGIN
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="12">Emission Date</text>"#,
        WIDTH / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="15" y="{}" font-size="12" transform="rotate(-90 15 {})">Emissions</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0
    );

    if let (Some(first), Some(last)) = (first, last) {
        let coords: Vec<String> = points
            .iter()
            .map(|p| {
                let x = MARGIN + (p.date - first).num_days() as f64 / span_days * plot_w;
                let y = HEIGHT - MARGIN - (p.value - min_v) / span_v * plot_h;
                format!("{x:.1},{y:.1}")
            })
            .collect();
        let _ = writeln!(
            svg,
            r#"<polyline fill="none" stroke="steelblue" stroke-width="2" points="{}"/>"#,
            coords.join(" ")
        );
        let _ = writeln!(
            svg,
            r#"<text x="{MARGIN}" y="{}" font-size="11">{}</text><text x="{}" y="{}" text-anchor="end" font-size="11">{}</text>"#,
            HEIGHT - MARGIN + 16.0,
            format_date(first),
            WIDTH - MARGIN,
            HEIGHT - MARGIN + 16.0,
            format_date(last)
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="end" font-size="11">{min_v}</text><text x="{}" y="{}" text-anchor="end" font-size="11">{max_v}</text>"#,
            MARGIN - 4.0,
            HEIGHT - MARGIN,
            MARGIN - 4.0,
            MARGIN + 4.0
        );
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, value: f64) -> TrendPoint {
        TrendPoint {
            date: crate::table::parse_date(date).unwrap(),
            value,
        }
    }

    #[test]
    fn slug_collapses_separators() {
        assert_eq!(slug("Production of Pig iron or steel"), "production_of_pig_iron_or_steel");
        assert_eq!(slug("  Iron, steel (primary) "), "iron_steel_primary");
        assert_eq!(slug("***"), "industry");
    }

    #[test]
    fn chart_contains_title_and_polyline() {
        let svg = svg_chart(
            "Refining & <oil>",
            &[point("2019-01-01", 10.0), point("2019-01-03", 30.0)],
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Trend of Refining &amp; &lt;oil&gt; Emissions Over Time"));
        assert!(svg.contains("points=\"60.0,440.0 940.0,60.0\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn chart_without_points_has_no_polyline() {
        let svg = svg_chart("Steel", &[]);
        assert!(!svg.contains("polyline"));
    }

    #[tokio::test]
    async fn svg_renderer_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SvgTrendRenderer::new(dir.path().join("plots"));
        let location = renderer
            .render("Steel", &[point("2020-01-01", 1.0)])
            .await
            .unwrap();

        assert!(location.ends_with("steel_trend.svg"));
        let written = std::fs::read_to_string(renderer.path_for("Steel")).unwrap();
        assert!(written.contains("Trend of Steel"));
    }
}
