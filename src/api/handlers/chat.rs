use crate::{
    AppState,
    relay::RelaySettings,
    types::{AppError, ChatReply, ChatRequest, Result},
};
use axum::{Json, extract::State, extract::rejection::JsonRejection};

/// Relay a chat message to the upstream webhook.
///
/// Responds 400 when the message is missing or blank. Upstream failures
/// still answer 200, with a canned reply and `error: true`.
pub async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Rejected chat body: {}", rejection.body_text());
        AppError::InvalidInput("Message is required".to_string())
    })?;

    let settings = RelaySettings::from_config(&state.config_manager.config());
    let reply = state.relay.relay(&request, &settings).await?;

    Ok(Json(reply))
}
