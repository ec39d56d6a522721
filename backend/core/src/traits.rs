use async_trait::async_trait;

use crate::error::SummarizerError;

/// What a summarizer hands back: either the text field it was asked for,
/// or an opaque payload of some other shape.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryPayload {
    Text(String),
    Opaque(serde_json::Value),
}

impl SummaryPayload {
    /// Coerce the payload to summary text.
    ///
    /// Opaque payloads are rendered as compact JSON, so the same payload always
    /// yields the same text. A payload that is blank after coercion is an error.
    pub fn into_text(self) -> Result<String, SummarizerError> {
        let text = match self {
            SummaryPayload::Text(text) => text,
            SummaryPayload::Opaque(serde_json::Value::String(text)) => text,
            SummaryPayload::Opaque(serde_json::Value::Null) => String::new(),
            SummaryPayload::Opaque(value) => value.to_string(),
        };
        if text.trim().is_empty() {
            return Err(SummarizerError::Empty);
        }
        Ok(text)
    }
}

/// Black-box text generation service used to produce summaries.
///
/// One blocking call per compaction; implementations must decode
/// deterministically (temperature 0).
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Provider name (e.g., "ollama").
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<SummaryPayload, SummarizerError>;
}
