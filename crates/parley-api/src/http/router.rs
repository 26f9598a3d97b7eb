//! Axum router configuration with middleware.
//!
//! Routes live under `/api/chat`. Middleware: permissive CORS (the widget is
//! embedded on third-party origins) and request tracing.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/chat",
            get(handlers::chat::get_history)
                .post(handlers::chat::send_message)
                .delete(handlers::chat::clear_history),
        )
        .route("/chat/sessions", get(handlers::session::list_sessions))
        .route("/chat/sessions/{id}", get(handlers::session::get_session));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness check.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
