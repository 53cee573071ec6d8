//! Conversation inspection handlers.
//!
//! Read and clear the per-session context kept by the relay.

use crate::{
    AppState,
    types::{
        AppError, ClearResponse, ConversationResponse, Result, SessionListResponse,
        SessionSummary,
    },
};
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

/// Get the stored context for a session.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ConversationResponse>> {
    let context = state
        .store
        .lookup(&session_id)
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    Ok(Json(ConversationResponse {
        session_id,
        history: context.history.to_vec(),
        preferences: context.preferences,
    }))
}

/// Clear a session's context. Succeeds whether or not it existed.
pub async fn clear_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ClearResponse> {
    let removed = state.store.clear(&session_id);
    info!(session_id = %session_id, removed, "Conversation cleared");

    Json(ClearResponse {
        message: "Conversation cleared successfully".to_string(),
        session_id,
    })
}

/// List sessions that currently hold context.
pub async fn list_conversations(State(state): State<AppState>) -> Json<SessionListResponse> {
    let sessions = state
        .store
        .sessions()
        .into_iter()
        .map(|(session_id, exchanges)| SessionSummary {
            session_id,
            exchanges,
        })
        .collect();

    Json(SessionListResponse { sessions })
}
