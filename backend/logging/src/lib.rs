//! Telemetry and structured logging components for Scribe.
//!
//! Handles log redaction, JSON output generation, file rotation, and history event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, HistoryEvent};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
