//! Shared test harness for E2E tests.
//!
//! Wires the real `OllamaClient` to a wiremock server standing in for
//! Ollama, on top of the sample emissions table and a recording renderer.

#![allow(dead_code)]

use ea_assistant::assistant::Assistant;
use ea_assistant::config::NarrativeConfig;
use ea_assistant::inference::{OllamaClient, OllamaConfig};
use ea_assistant::pipeline::Pipeline;
use ea_assistant::registry::OperationRegistry;
use ea_data_tools::{EmissionTable, MockRenderer, sample_table};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Marker text only the intent prompt contains.
const INTENT_PROMPT_MARKER: &str = "USER QUERY";
/// Marker text only the narrative prompt contains.
const NARRATIVE_PROMPT_MARKER: &str = "STRICT RULES";

pub struct TestHarness {
    /// Fake Ollama `/api/chat` endpoint.
    pub server: MockServer,
    pub client: OllamaClient,
    pub registry: OperationRegistry,
    pub table: EmissionTable,
    pub renderer: MockRenderer,
}

impl TestHarness {
    /// Harness with the sample table and a 2s client timeout.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let client = OllamaClient::new(OllamaConfig {
            host: server.uri(),
            model: "deepseek-r1".into(),
            timeout_secs: 2,
        });
        Self {
            server,
            client,
            registry: OperationRegistry::with_defaults(),
            table: sample_table(),
            renderer: MockRenderer::new(),
        }
    }

    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.registry, &self.table, &self.renderer, &self.client)
    }

    pub fn assistant(&self, narrative: NarrativeConfig) -> Assistant<'_> {
        Assistant::new(self.pipeline(), narrative)
    }

    /// Answer the next intent prompt with `content` (once).
    pub async fn reply_to_intent(&self, content: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_string_contains(INTENT_PROMPT_MARKER))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Answer every intent prompt with the given status code.
    pub async fn fail_intent(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_string_contains(INTENT_PROMPT_MARKER))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Answer narrative prompts (non-streaming) with `content`.
    pub async fn reply_to_narrative(&self, content: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"stream": false})))
            .and(body_string_contains(NARRATIVE_PROMPT_MARKER))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
            .mount(&self.server)
            .await;
    }

    /// Answer streaming narrative prompts with one NDJSON line per fragment.
    pub async fn stream_narrative(&self, fragments: &[&str]) {
        let mut body = String::new();
        for fragment in fragments {
            body.push_str(&json!({"message": {"role": "assistant", "content": fragment}, "done": false}).to_string());
            body.push('\n');
        }
        body.push_str(&json!({"message": {"role": "assistant", "content": ""}, "done": true}).to_string());
        body.push('\n');
        self.stream_narrative_body(&body).await;
    }

    /// Answer streaming narrative prompts with a raw NDJSON body.
    pub async fn stream_narrative_body(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"stream": true})))
            .and(body_string_contains(NARRATIVE_PROMPT_MARKER))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(&self.server)
            .await;
    }

    /// Number of requests the fake backend has seen.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

/// Ollama non-streaming chat response body.
pub fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "model": "deepseek-r1",
        "message": {"role": "assistant", "content": content},
        "done": true
    })
}
