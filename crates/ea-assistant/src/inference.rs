//! Ollama inference client.
//!
//! Calls the Ollama HTTP API (`/api/chat`) either as a single request
//! returning the whole completion, or as a stream of NDJSON chunks that
//! is pulled fragment by fragment. The model's output is free text; no
//! structured function-calling API is used.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, InferenceResult};

/// Upper bound on establishing the TCP/TLS connection.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the Ollama endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Ollama HTTP API base URL.
    #[serde(default = "default_host")]
    pub host: String,
    /// Model to use for inference.
    #[serde(default = "default_model")]
    pub model: String,
    /// Timeout in seconds. Bounds a whole non-streaming request, and the
    /// gap between chunks of a streamed one. Reasoning models are slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "deepseek-r1".into()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Anything that turns a prompt into free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Full completion for `prompt`.
    async fn generate(&self, prompt: &str) -> InferenceResult<String>;

    /// Completion delivered to `sink` fragment by fragment; returns the
    /// concatenated text. Defaults to one fragment.
    async fn generate_stream(
        &self,
        prompt: &str,
        sink: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> InferenceResult<String> {
        let text = self.generate(prompt).await?;
        sink(&text);
        Ok(text)
    }
}

/// Ollama chat API request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage<'a>],
    stream: bool,
}

/// A single message in the chat request.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }
}

/// Ollama chat API response, or one line of a streamed response.
#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for the Ollama chat endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// The client carries only per-read and connect limits, so a stream
    /// may run as long as chunks keep arriving. Non-streaming requests get
    /// a total timeout in `send`.
    pub fn new(config: OllamaConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
            .read_timeout(timeout)
            .build()
            .expect("failed to build reqwest client");
        Self { client, config }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    async fn send(
        &self,
        messages: &[ChatMessage<'_>],
        stream: bool,
    ) -> InferenceResult<reqwest::Response> {
        let url = format!("{}/api/chat", self.config.host);
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            stream,
        };

        let mut request = self.client.post(&url).json(&body);
        if !stream {
            request = request.timeout(Duration::from_secs(self.config.timeout_secs));
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "ollama request failed");
                InferenceError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "ollama returned non-200");
            return Err(InferenceError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    /// One request, whole completion back.
    pub async fn chat(&self, messages: &[ChatMessage<'_>]) -> InferenceResult<String> {
        let response = self.send(messages, false).await?;
        let chat_resp: ChatResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse ollama response body");
            InferenceError::Decode(e.to_string())
        })?;

        if let Some(err) = chat_resp.error {
            return Err(InferenceError::Decode(err));
        }
        let content = chat_resp.message.map(|m| m.content).unwrap_or_default();
        if content.trim().is_empty() {
            return Err(InferenceError::Empty);
        }
        Ok(content.trim().to_string())
    }

    /// Streamed request. Fragments are pulled lazily from the response.
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage<'_>],
    ) -> InferenceResult<FragmentStream> {
        let response = self.send(messages, true).await?;
        Ok(FragmentStream::new(response))
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> InferenceResult<String> {
        self.chat(&[ChatMessage::system(prompt)]).await
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        sink: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> InferenceResult<String> {
        let stream = self.chat_stream(&[ChatMessage::system(prompt)]).await?;
        stream.collect_text(sink).await
    }
}

// ── Fragment stream ───────────────────────────────────────────

/// Finite, non-restartable sequence of completion fragments.
///
/// Each NDJSON line of the response carries one fragment; the line with
/// `"done": true` ends the sequence.
pub struct FragmentStream {
    response: reqwest::Response,
    buf: Vec<u8>,
    exhausted: bool,
    finished: bool,
}

impl FragmentStream {
    fn new(response: reqwest::Response) -> Self {
        Self {
            response,
            buf: Vec::new(),
            exhausted: false,
            finished: false,
        }
    }

    /// Next non-empty fragment, `None` once the stream has ended.
    pub async fn next_fragment(&mut self) -> Option<InferenceResult<String>> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(line) = self.take_line() {
                match decode_line(&line) {
                    Ok(None) => continue,
                    Ok(Some((content, done))) => {
                        self.finished = done;
                        if content.is_empty() {
                            continue;
                        }
                        return Some(Ok(content));
                    }
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
            }

            if self.exhausted {
                self.finished = true;
                return None;
            }

            match self.response.chunk().await {
                Ok(Some(bytes)) => self.buf.extend_from_slice(&bytes),
                Ok(None) => self.exhausted = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(InferenceError::Transport(e.to_string())));
                }
            }
        }
    }

    /// Drain the stream, passing each fragment to `sink`, and return the
    /// concatenation.
    pub async fn collect_text(
        mut self,
        sink: &mut (dyn for<'s> FnMut(&'s str) + Send),
    ) -> InferenceResult<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next_fragment().await {
            let fragment = fragment?;
            sink(&fragment);
            text.push_str(&fragment);
        }
        if text.trim().is_empty() {
            return Err(InferenceError::Empty);
        }
        Ok(text)
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            return Some(self.buf.drain(..=pos).collect());
        }
        if self.exhausted && !self.buf.is_empty() {
            return Some(std::mem::take(&mut self.buf));
        }
        None
    }
}

/// `Ok(None)` for blank lines, else `(content, done)`.
fn decode_line(line: &[u8]) -> InferenceResult<Option<(String, bool)>> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let chunk: ChatResponse =
        serde_json::from_slice(line).map_err(|e| InferenceError::Decode(e.to_string()))?;
    if let Some(err) = chunk.error {
        return Err(InferenceError::Decode(err));
    }
    let content = chunk.message.map(|m| m.content).unwrap_or_default();
    Ok(Some((content, chunk.done)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Helper: build an Ollama chat response body.
    fn ollama_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "deepseek-r1",
            "message": {
                "role": "assistant",
                "content": content
            },
            "done": true
        })
    }

    /// Build an OllamaClient pointed at the mock server.
    fn client_for(server: &MockServer) -> OllamaClient {
        OllamaClient::new(OllamaConfig {
            host: server.uri(),
            model: "deepseek-r1".into(),
            timeout_secs: 2,
        })
    }

    #[tokio::test]
    async fn generate_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-r1",
                "stream": false,
                "messages": [{"role": "system", "content": "hello"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ollama_response("  UUU_: plot_trend(\"x\")\n")),
            )
            .mount(&server)
            .await;

        let text = client_for(&server).generate("hello").await.unwrap();
        assert_eq!(text, "UUU_: plot_trend(\"x\")");
    }

    #[tokio::test]
    async fn generate_non_200_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Status(503)));
    }

    #[tokio::test]
    async fn generate_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_response("   ")))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Empty));
    }

    #[tokio::test]
    async fn generate_garbage_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    #[tokio::test]
    async fn generate_backend_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"error": "model not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).generate("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Decode(msg) if msg == "model not found"));
    }

    #[tokio::test]
    async fn generate_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ollama_response("late"))
                    .set_delay(std::time::Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        // Client timeout is 2s, mock delays 10s → timeout
        let err = client_for(&server).generate("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Transport(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let client = OllamaClient::new(OllamaConfig {
            host: "http://127.0.0.1:9".into(),
            model: "deepseek-r1".into(),
            timeout_secs: 2,
        });
        let err = client.generate("q").await.unwrap_err();
        assert!(matches!(err, InferenceError::Transport(_)));
    }

    fn ndjson(fragments: &[&str]) -> String {
        let mut body = String::new();
        for f in fragments {
            body.push_str(
                &serde_json::json!({"message": {"role": "assistant", "content": f}, "done": false})
                    .to_string(),
            );
            body.push('\n');
        }
        body.push_str(r#"{"message":{"role":"assistant","content":""},"done":true}"#);
        body.push('\n');
        body
    }

    #[tokio::test]
    async fn stream_yields_fragments_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(&[
                "The ", "cement ", "", "industry", " led.",
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut stream = client
            .chat_stream(&[ChatMessage::system("narrate")])
            .await
            .unwrap();

        let mut fragments = Vec::new();
        while let Some(f) = stream.next_fragment().await {
            fragments.push(f.unwrap());
        }
        assert_eq!(fragments, vec!["The ", "cement ", "industry", " led."]);
        assert!(stream.next_fragment().await.is_none(), "stream does not restart");
    }

    #[tokio::test]
    async fn generate_stream_feeds_sink_and_concatenates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ndjson(&["a", "b", "c"])))
            .mount(&server)
            .await;

        let mut seen = Vec::new();
        let mut sink = |f: &str| seen.push(f.to_string());
        let text = client_for(&server)
            .generate_stream("p", &mut sink)
            .await
            .unwrap();
        assert_eq!(text, "abc");
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn stream_without_trailing_newline() {
        let server = MockServer::start().await;
        let body = r#"{"message":{"role":"assistant","content":"only"},"done":true}"#;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let stream = client_for(&server)
            .chat_stream(&[ChatMessage::system("p")])
            .await
            .unwrap();
        let text = stream.collect_text(&mut |_: &str| {}).await.unwrap();
        assert_eq!(text, "only");
    }

    #[tokio::test]
    async fn stream_bad_line_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{broken\n"))
            .mount(&server)
            .await;

        let stream = client_for(&server)
            .chat_stream(&[ChatMessage::system("p")])
            .await
            .unwrap();
        let err = stream.collect_text(&mut |_: &str| {}).await.unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    /// Serve one streamed chat response whose chunks arrive `gap` apart,
    /// over plain HTTP/1.1 with chunked encoding. Returns the base URL.
    async fn slow_stream_server(fragments: &'static [&'static str], gap: Duration) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Read the request head and its Content-Length body.
            let mut req = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                req.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&req).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let len = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if req.len() >= head_end + 4 + len {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\n\
                      transfer-encoding: chunked\r\n\r\n",
                )
                .await
                .unwrap();
            let mut lines: Vec<String> = fragments
                .iter()
                .map(|f| serde_json::json!({"message": {"content": f}, "done": false}).to_string())
                .collect();
            lines.push(serde_json::json!({"message": {"content": ""}, "done": true}).to_string());
            for line in lines {
                tokio::time::sleep(gap).await;
                let payload = format!("{line}\n");
                let chunk = format!("{:x}\r\n{payload}\r\n", payload.len());
                socket.write_all(chunk.as_bytes()).await.unwrap();
            }
            socket.write_all(b"0\r\n\r\n").await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn stream_outlives_timeout_while_chunks_keep_coming() {
        // Five chunks 400ms apart: 2s total against a 1s timeout.
        let host = slow_stream_server(&["a", "b", "c", "d"], Duration::from_millis(400)).await;
        let client = OllamaClient::new(OllamaConfig {
            host,
            model: "deepseek-r1".into(),
            timeout_secs: 1,
        });
        assert_eq!(client.config().timeout_secs, 1);

        let mut seen = Vec::new();
        let text = client
            .generate_stream("p", &mut |f: &str| seen.push(f.to_string()))
            .await
            .unwrap();
        assert_eq!(text, "abcd");
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost:11434");
        assert_eq!(config.model, "deepseek-r1");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
host = "http://192.168.1.50:11434"
model = "llama3.2"
timeout_secs = 30
"#;
        let config: OllamaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "http://192.168.1.50:11434");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.timeout_secs, 30);
    }
}
