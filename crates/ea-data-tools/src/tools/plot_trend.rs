//! plot_trend: render an industry's series as a chart.

use async_trait::async_trait;
use ea_protocol::CallArg;

use super::required_text;
use crate::error::DataResult;
use crate::render::TrendPoint;
use crate::types::{EmissionTool, OperationOutput, Param, ToolContext};

pub struct PlotTrend;

#[async_trait]
impl EmissionTool for PlotTrend {
    fn name(&self) -> &str {
        "plot_trend"
    }

    fn description(&self) -> &str {
        "Plot the emission trend of an industry over time"
    }

    fn params(&self) -> &'static [Param] {
        const PARAMS: &[Param] = &[Param::required("industry")];
        PARAMS
    }

    async fn execute(
        &self,
        args: &[CallArg],
        ctx: &ToolContext<'_>,
    ) -> DataResult<OperationOutput> {
        let industry = required_text(args, 0, "industry")?;
        let idx = ctx.table.require_industry(industry)?;

        // Missing values are gaps, not zeros.
        let points: Vec<TrendPoint> = ctx
            .table
            .series(idx)
            .into_iter()
            .filter_map(|(date, value)| {
                Some(TrendPoint {
                    date,
                    value: value?.as_f64()?,
                })
            })
            .collect();

        let location = ctx.renderer.render(industry, &points).await?;
        Ok(OperationOutput::SideEffect {
            description: format!("Trend plot for {industry} saved to {location}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::mock::{MockRenderer, sample_table};

    #[tokio::test]
    async fn renders_series_and_describes_artifact() {
        let table = sample_table();
        let renderer = MockRenderer::new();
        let ctx = ToolContext {
            table: &table,
            renderer: &renderer,
        };

        let out = PlotTrend
            .execute(&[CallArg::text("Production of Pig iron or steel")], &ctx)
            .await
            .unwrap();

        assert_eq!(
            out,
            OperationOutput::SideEffect {
                description: "Trend plot for Production of Pig iron or steel saved to \
                              memory://Production of Pig iron or steel"
                    .into()
            }
        );
        assert_eq!(renderer.rendered(), vec!["Production of Pig iron or steel"]);
        let points = renderer.last_points().unwrap();
        assert_eq!(points.len(), 4, "empty cell on 2019-07-18 is skipped");
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn unknown_industry_renders_nothing() {
        let table = sample_table();
        let renderer = MockRenderer::new();
        let ctx = ToolContext {
            table: &table,
            renderer: &renderer,
        };

        let err = PlotTrend
            .execute(&[CallArg::text("Nope")], &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::UnknownIndustry(_)));
        assert!(renderer.rendered().is_empty());
    }
}
