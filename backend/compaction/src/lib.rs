//! Compaction engine: folds the recent window of a conversation into a
//! summary anchor and prunes the originals it replaced.

pub mod engine;
pub mod in_flight;
pub mod policy;
pub mod prompt;

pub use engine::{CompactionEngine, CompactionOutcome};
pub use in_flight::{InFlightGuard, InFlightSessions};
pub use policy::CompactionPolicy;
pub use prompt::build_prompt;
