use crate::AppState;
use crate::api::handlers;
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::any::Any;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as CorsAny, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

/// Largest accepted request body, in bytes.
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Routes mounted under `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/health", get(handlers::health::health))
        .route("/conversations", get(handlers::conversations::list_conversations))
        .route(
            "/conversation/{session_id}",
            get(handlers::conversations::get_conversation)
                .delete(handlers::conversations::clear_conversation),
        )
}

/// Full application: API routes, the static chat UI, and middleware.
pub fn build_app(state: AppState) -> Router {
    let static_dir = state.config_manager.config().server.static_dir.clone();
    if !static_dir.exists() {
        tracing::warn!(path = %static_dir.display(), "Static UI directory not found");
    }

    let cors = CorsLayer::new()
        .allow_origin(CorsAny)
        .allow_methods(CorsAny)
        .allow_headers(CorsAny);

    Router::new()
        .nest("/api", create_router())
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Unhandled error: {}", detail);

    let body = serde_json::json!({
        "error": "Internal server error",
        "message": "Something went wrong on our end"
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
