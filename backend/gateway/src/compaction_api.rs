//! Compaction trigger and bounded-context read.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use scribe_compaction::CompactionOutcome;
use scribe_core::MessageView;

use crate::error::ApiError;
use crate::server::GatewayState;

/// What the downstream generator should be given for a session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub session_id: String,
    /// Newest summary anchor, if the session was ever compacted.
    pub summary: Option<String>,
    pub messages: Vec<MessageView>,
}

/// Handler for `POST /internal/maybe-summarize/:session_id`.
///
/// 204 when the call compacted or had nothing to do, 409 when a compaction of
/// the same session is already running, 502 when the summarizer failed.
pub async fn trigger_compaction(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.engine.maybe_compact(&session_id).await? {
        CompactionOutcome::AlreadyRunning => Ok(StatusCode::CONFLICT),
        CompactionOutcome::Skipped { .. } | CompactionOutcome::Compacted { .. } => {
            Ok(StatusCode::NO_CONTENT)
        }
    }
}

/// Handler for `GET /context/:session_id`.
pub async fn get_context(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<ContextResponse>, ApiError> {
    let summary = state.store.latest_summary(&session_id).await?;
    let messages = state.store.list_conversation(&session_id).await?;
    Ok(Json(ContextResponse {
        session_id,
        summary: summary.map(|m| m.content),
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}
