//! Query pipeline: resolve, extract, parse, dispatch, normalize.
//!
//! `process` is the single entry point the presentation layer consumes.
//! Every failure is returned as a `PipelineError`; none escape as panics.

use std::time::Instant;

use ea_data_tools::{EmissionTable, ToolContext, TrendRenderer};
use ea_protocol::{NormalizedResult, extract_call, parse_call};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::inference::TextGenerator;
use crate::normalize::normalize;
use crate::registry::OperationRegistry;
use crate::resolver;

/// Runs queries against a loaded table.
///
/// Borrows everything it needs; the table is read-only, so one pipeline
/// can serve any number of sequential queries.
pub struct Pipeline<'a> {
    registry: &'a OperationRegistry,
    table: &'a EmissionTable,
    renderer: &'a dyn TrendRenderer,
    generator: &'a dyn TextGenerator,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        registry: &'a OperationRegistry,
        table: &'a EmissionTable,
        renderer: &'a dyn TrendRenderer,
        generator: &'a dyn TextGenerator,
    ) -> Self {
        Self {
            registry,
            table,
            renderer,
            generator,
        }
    }

    pub fn generator(&self) -> &'a dyn TextGenerator {
        self.generator
    }

    /// Answer a natural-language query.
    pub async fn process(&self, query: &str) -> Result<NormalizedResult, PipelineError> {
        let query_id = Uuid::now_v7();
        let span = tracing::info_span!("query", %query_id);

        async {
            let start = Instant::now();
            let outcome = self.resolve_and_run(query).await;
            let latency_ms = start.elapsed().as_millis() as u64;
            match &outcome {
                Ok(_) => tracing::info!(latency_ms, "query answered"),
                Err(e) => tracing::warn!(latency_ms, kind = e.kind(), error = %e, "query failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn resolve_and_run(&self, query: &str) -> Result<NormalizedResult, PipelineError> {
        let raw = resolver::resolve(
            self.generator,
            query,
            &self.registry.list_operations(),
            self.table.industries(),
        )
        .await?;
        self.process_raw(&raw).await
    }

    /// Run the pipeline from raw generator text onward.
    pub async fn process_raw(&self, raw: &str) -> Result<NormalizedResult, PipelineError> {
        let expr = extract_call(raw).map_err(|e| {
            tracing::warn!(error = %e, content = %raw, "no call in generator output");
            e
        })?;
        let call = parse_call(&expr).map_err(|e| {
            tracing::warn!(error = %e, expr = %expr, "malformed call expression");
            e
        })?;

        tracing::info!(
            operation = %call.name,
            arg_count = call.args.len(),
            call = %call,
            "dispatching"
        );

        let ctx = ToolContext {
            table: self.table,
            renderer: self.renderer,
        };
        let output = self.registry.dispatch(&call, &ctx).await.into_result()?;

        let result = normalize(&output);
        if result.is_no_data() {
            tracing::debug!(operation = %call.name, "query matched no rows");
        }
        Ok(result)
    }
}
