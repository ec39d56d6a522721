use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use logging::{EventLogger, HistoryEvent};
use scribe_core::{ScribeResult, Summarizer, SummaryPayload};
use scribe_store::MessageStore;

use crate::in_flight::InFlightSessions;
use crate::policy::CompactionPolicy;
use crate::prompt::build_prompt;

/// What one `maybe_compact` call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompactionOutcome {
    /// Window below the threshold; nothing was read from the summarizer or
    /// written to the store.
    Skipped { window_len: usize },
    /// Another compaction of the same session is still running.
    AlreadyRunning,
    /// A summary anchor was written and the window's originals pruned.
    Compacted {
        summary_id: i64,
        /// Newest id of the fetched window.
        boundary: i64,
        pruned: u64,
    },
}

/// Reads a bounded recent window, summarizes it, anchors the summary, and
/// prunes the originals it covers.
pub struct CompactionEngine {
    store: Arc<dyn MessageStore>,
    summarizer: Arc<dyn Summarizer>,
    policy: CompactionPolicy,
    in_flight: InFlightSessions,
}

impl CompactionEngine {
    pub fn new(store: Arc<dyn MessageStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            store,
            summarizer,
            policy: CompactionPolicy::default(),
            in_flight: InFlightSessions::new(),
        }
    }

    pub fn with_policy(mut self, policy: CompactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &CompactionPolicy {
        &self.policy
    }

    pub fn is_compacting(&self, session_id: &str) -> bool {
        self.in_flight.is_active(session_id)
    }

    /// Compact `session_id` if its recent window is long enough.
    ///
    /// A failed summarizer call leaves the store untouched and is returned as
    /// `ScribeError::Summarizer`. Pruning happens only after the summary row
    /// is stored, and only up to the newest id of the window read here, so
    /// messages appended meanwhile survive.
    #[instrument(skip(self), fields(summarizer = %self.summarizer.name()))]
    pub async fn maybe_compact(&self, session_id: &str) -> ScribeResult<CompactionOutcome> {
        let Some(_guard) = self.in_flight.try_acquire(session_id) else {
            debug!(session_id = %session_id, "Compaction already in flight");
            return Ok(CompactionOutcome::AlreadyRunning);
        };

        let window = self
            .store
            .recent_window(session_id, self.policy.window_size)
            .await?;
        let boundary = match window.iter().map(|m| m.id).max() {
            Some(id) if self.policy.should_compact(window.len()) => id,
            _ => {
                debug!(
                    session_id = %session_id,
                    window_len = window.len(),
                    min = self.policy.min_messages,
                    "Window below compaction threshold"
                );
                return Ok(CompactionOutcome::Skipped { window_len: window.len() });
            }
        };

        let previous = self.store.latest_summary(session_id).await?;
        let prompt = build_prompt(&self.policy.instruction, previous.as_ref(), &window);

        let summary = match self
            .summarizer
            .generate(&prompt)
            .await
            .and_then(SummaryPayload::into_text)
        {
            Ok(text) => text,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Summarizer failed; compaction aborted");
                EventLogger::log_event(
                    session_id,
                    HistoryEvent::CompactionFailed { error_msg: e.to_string() },
                );
                return Err(e.into());
            }
        };

        let summary_id = self.store.append_summary(session_id, &summary).await?;
        let pruned = self.store.prune_up_to(session_id, boundary).await?;

        info!(
            session_id = %session_id,
            summary_id,
            boundary,
            pruned,
            "Conversation compacted"
        );
        EventLogger::log_event(
            session_id,
            HistoryEvent::Compacted { summary_id, boundary, pruned, summary },
        );

        Ok(CompactionOutcome::Compacted { summary_id, boundary, pruned })
    }
}
