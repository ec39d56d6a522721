//! Session and message endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use logging::{EventLogger, HistoryEvent};
use scribe_core::{new_session_id, MessageView, Role};

use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AppendRequest {
    pub role: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    pub insert_id: String,
}

/// Handler for `GET|POST /session`.
pub async fn create_session() -> Json<SessionCreated> {
    Json(SessionCreated {
        session_id: new_session_id(),
    })
}

/// Handler for `GET /messages/:session_id`.
pub async fn list_messages(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let messages = state.store.list_conversation(&session_id).await?;
    Ok(Json(messages.into_iter().map(MessageView::from).collect()))
}

/// Handler for `POST /messages/:session_id`.
pub async fn append_message(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    payload: Result<Json<AppendRequest>, JsonRejection>,
) -> Result<Json<AppendResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    let role: Role = payload
        .role
        .as_deref()
        .ok_or_else(|| ApiError::validation("missing role"))?
        .parse()?;
    let content = payload
        .content
        .ok_or_else(|| ApiError::validation("missing content"))?;

    let id = state.store.append(&session_id, role, &content).await?;
    EventLogger::log_event(
        &session_id,
        HistoryEvent::MessageAppended {
            id,
            role: role.to_string(),
            content,
        },
    );

    Ok(Json(AppendResponse {
        insert_id: id.to_string(),
    }))
}

/// Handler for `DELETE /messages/:session_id/:id`. Removes `id` and everything after it.
pub async fn truncate_messages(
    State(state): State<GatewayState>,
    Path((session_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let from_id: i64 = id
        .parse()
        .map_err(|_| ApiError::validation(format!("invalid message id: {id}")))?;

    let removed = state.store.truncate_from(&session_id, from_id).await?;
    info!(session_id = %session_id, from_id, removed, "Conversation truncated");
    EventLogger::log_event(&session_id, HistoryEvent::Truncated { from_id, removed });

    Ok(StatusCode::NO_CONTENT)
}
