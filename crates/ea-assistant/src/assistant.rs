//! Conversational front: pipeline result plus optional narrative.

use ea_protocol::NormalizedResult;

use crate::config::NarrativeConfig;
use crate::error::PipelineError;
use crate::narrate::narrative_prompt;
use crate::pipeline::Pipeline;
use crate::session::ChatSession;

/// Sent between an interrupted narrative and the plain fallback.
pub const FALLBACK_SEPARATOR: &str = "\n\n";

pub struct Assistant<'a> {
    pipeline: Pipeline<'a>,
    narrative: NarrativeConfig,
}

impl<'a> Assistant<'a> {
    pub fn new(pipeline: Pipeline<'a>, narrative: NarrativeConfig) -> Self {
        Self {
            pipeline,
            narrative,
        }
    }

    /// Answer one query, appending both turns to `session`.
    ///
    /// Reply text goes to `sink` as it becomes available. If the
    /// narrative backend fails, the plain rendering follows whatever was
    /// already sent. The returned reply is exactly what `sink` received.
    pub async fn respond(
        &self,
        mut session: ChatSession,
        query: &str,
        sink: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> (ChatSession, String) {
        session.push_user(query);
        let outcome = self.pipeline.process(query).await;

        let mut sent = String::new();
        if self.narrative.enabled {
            let narrated = {
                let mut tee = |fragment: &str| {
                    sent.push_str(fragment);
                    sink(fragment);
                };
                self.narrate(&outcome, &mut tee).await
            };
            if let Err(e) = narrated {
                tracing::warn!(
                    error = %e,
                    partial_len = sent.len(),
                    "narrative generation failed, sending plain result"
                );
                if !sent.is_empty() {
                    sink(FALLBACK_SEPARATOR);
                    sent.push_str(FALLBACK_SEPARATOR);
                }
                let plain = render_plain(&outcome);
                sink(&plain);
                sent.push_str(&plain);
            }
        } else {
            let plain = render_plain(&outcome);
            sink(&plain);
            sent = plain;
        }

        session.push_assistant(sent.clone());
        (session, sent)
    }

    async fn narrate(
        &self,
        outcome: &Result<NormalizedResult, PipelineError>,
        sink: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> Result<String, crate::error::InferenceError> {
        let prompt = narrative_prompt(outcome);
        let generator = self.pipeline.generator();
        if self.narrative.stream {
            generator.generate_stream(&prompt, sink).await
        } else {
            let text = generator.generate(&prompt).await?;
            sink(&text);
            Ok(text)
        }
    }
}

/// Result without the narrative stage: the message itself, the data
/// summary, pretty JSON for a row, or the error text.
pub fn render_plain(outcome: &Result<NormalizedResult, PipelineError>) -> String {
    match outcome {
        Ok(result) => match result.message_text().or_else(|| result.data_text()) {
            Some(text) => text.to_string(),
            None => serde_json::to_string_pretty(result.as_map())
                .unwrap_or_else(|_| format!("{:?}", result.as_map())),
        },
        Err(e) => e.to_string(),
    }
}
