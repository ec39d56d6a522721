//! Scribe Gateway HTTP API Server
//!
//! Session and message CRUD over the message store, plus the compaction trigger.

pub mod compaction_api;
pub mod error;
pub mod health_api;
pub mod messages_api;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState};
