use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use scribe_core::{Summarizer, SummarizerError, SummaryPayload};

#[derive(Debug, Clone)]
enum Reply {
    Payload(SummaryPayload),
    Fail(String),
}

/// A summarizer that returns canned responses.
#[derive(Debug)]
pub struct MockSummarizer {
    reply: Reply,
    calls: AtomicUsize,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self::with_response("Mock summary")
    }

    pub fn with_response(text: impl Into<String>) -> Self {
        Self::with_payload(SummaryPayload::Text(text.into()))
    }

    pub fn with_payload(payload: SummaryPayload) -> Self {
        Self {
            reply: Reply::Payload(payload),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with a connection error carrying `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            reply: Reply::Fail(reason.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _prompt: &str) -> Result<SummaryPayload, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Payload(payload) => Ok(payload.clone()),
            Reply::Fail(reason) => Err(SummarizerError::Connection(reason.clone())),
        }
    }
}
