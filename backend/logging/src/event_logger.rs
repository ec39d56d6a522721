//! History Event Logger
//!
//! Structured events (append, truncate, compaction) emitted as NDJSON records
//! under the `history_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryEvent {
    MessageAppended {
        id: i64,
        role: String,
        content: String,
    },
    Truncated {
        from_id: i64,
        removed: u64,
    },
    Compacted {
        summary_id: i64,
        boundary: i64,
        pruned: u64,
        summary: String,
    },
    CompactionFailed {
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: HistoryEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Build the redacted log record for an event.
    pub fn entry(session_id: &str, mut event: HistoryEvent) -> EventLogEntry {
        match &mut event {
            HistoryEvent::MessageAppended { content, .. } => {
                *content = redact_sensitive_data(content);
            }
            HistoryEvent::Compacted { summary, .. } => {
                *summary = redact_sensitive_data(summary);
            }
            HistoryEvent::CompactionFailed { error_msg } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            HistoryEvent::Truncated { .. } => {}
        }

        EventLogEntry {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Redact and emit one history event.
    pub fn log_event(session_id: &str, event: HistoryEvent) {
        let entry = Self::entry(session_id, event);
        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "history_events", event = %json, "History event"),
            Err(e) => warn!(target: "history_events", error = %e, "Failed to serialize history event"),
        }
    }
}
