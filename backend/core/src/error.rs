use thiserror::Error;

/// Top-level error type for the Scribe message store and compaction engine.
#[derive(Debug, Error)]
pub enum ScribeError {
    /// Missing or invalid input, rejected before the store is touched.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("summarizer error: {0}")]
    Summarizer(#[from] SummarizerError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScribeError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        ScribeError::Storage(err.to_string())
    }
}

pub type ScribeResult<T> = Result<T, ScribeError>;

/// Failure of one summarizer call. No retry happens at this layer.
#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("summarizer returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("summarizer returned an empty summary")]
    Empty,
}
