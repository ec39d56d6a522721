pub mod mock;
pub mod ollama;

pub use mock::MockSummarizer;
pub use ollama::OllamaSummarizer;
