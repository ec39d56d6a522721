use serde::{Deserialize, Serialize};

/// Default instruction placed at the top of every summarization prompt.
pub const DEFAULT_INSTRUCTION: &str =
    "Concisely summarize this part of the conversation, preserving the context needed to continue it:";

/// When to compact and how much to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionPolicy {
    /// Most recent qualifying messages fetched per attempt (W).
    pub window_size: usize,
    /// Windows smaller than this are left alone (MIN).
    pub min_messages: usize,
    pub instruction: String,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            window_size: 20,
            min_messages: 6,
            instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}

impl CompactionPolicy {
    pub fn with_window(mut self, window_size: usize, min_messages: usize) -> Self {
        self.window_size = window_size;
        self.min_messages = min_messages;
        self
    }

    /// A window this long is worth summarizing.
    pub fn should_compact(&self, window_len: usize) -> bool {
        window_len > 0 && window_len >= self.min_messages
    }
}
