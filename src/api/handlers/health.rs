use crate::{
    AppState,
    types::{HealthResponse, now_rfc3339},
};
use axum::{Json, extract::State};

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: now_rfc3339(),
        service: state.config_manager.config().server.service_name.clone(),
    })
}
