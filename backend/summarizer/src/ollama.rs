use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use scribe_core::{Summarizer, SummarizerError, SummaryPayload};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "mistral:7b-instruct-q4_K_M";

/// Summarizer backed by an Ollama server's `/api/generate` endpoint.
pub struct OllamaSummarizer {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizer {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Default for OllamaSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// A string `response` field is the summary; any other shape is kept whole.
fn payload_from_body(body: Value) -> SummaryPayload {
    match body.get("response") {
        Some(Value::String(text)) => SummaryPayload::Text(text.clone()),
        _ => SummaryPayload::Opaque(body),
    }
}

fn transport_error(err: reqwest::Error) -> SummarizerError {
    if err.is_timeout() {
        SummarizerError::Timeout
    } else {
        SummarizerError::Connection(err.to_string())
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<SummaryPayload, SummarizerError> {
        let start = Instant::now();

        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            temperature: 0.0,
            stream: false,
            options: OllamaOptions { temperature: 0.0 },
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending summary request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let raw = response.bytes().await.map_err(transport_error)?;
        let parsed: Value = serde_json::from_slice(&raw)
            .map_err(|e| SummarizerError::Malformed(e.to_string()))?;

        debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "Ollama summary received"
        );
        Ok(payload_from_body(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_shape() {
        let body = OllamaGenerateRequest {
            model: "m",
            prompt: "p",
            temperature: 0.0,
            stream: false,
            options: OllamaOptions { temperature: 0.0 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            json!({"model": "m", "prompt": "p", "temperature": 0.0, "stream": false, "options": {"temperature": 0.0}})
        );
    }

    #[test]
    fn test_payload_variants() {
        assert_eq!(
            payload_from_body(json!({"response": "short summary", "done": true})),
            SummaryPayload::Text("short summary".into())
        );
        let odd = json!({"response": {"nested": 1}});
        assert_eq!(payload_from_body(odd.clone()), SummaryPayload::Opaque(odd));
        let missing = json!({"done": true});
        assert_eq!(payload_from_body(missing.clone()), SummaryPayload::Opaque(missing));
    }

    #[tokio::test]
    async fn test_generate_posts_deterministic_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(json!({
                "model": "tiny",
                "prompt": "Summarize:\nuser: hi",
                "temperature": 0.0,
                "stream": false,
                "options": {"temperature": 0.0}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "greeting"})))
            .expect(1)
            .mount(&server)
            .await;

        let summarizer = OllamaSummarizer::new()
            .with_base_url(format!("{}/", server.uri()))
            .with_model("tiny");
        let payload = summarizer.generate("Summarize:\nuser: hi").await.unwrap();
        assert_eq!(payload, SummaryPayload::Text("greeting".into()));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let summarizer = OllamaSummarizer::new().with_base_url(server.uri());
        let err = summarizer.generate("p").await.unwrap_err();
        assert!(matches!(err, SummarizerError::Status { status: 500, ref body } if body == "model not loaded"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
            .mount(&server)
            .await;

        let summarizer = OllamaSummarizer::new().with_base_url(server.uri());
        let err = summarizer.generate("p").await.unwrap_err();
        assert!(matches!(err, SummarizerError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let summarizer = OllamaSummarizer::new().with_base_url("http://127.0.0.1:9");
        let err = summarizer.generate("p").await.unwrap_err();
        assert!(matches!(err, SummarizerError::Connection(_)));
    }
}
