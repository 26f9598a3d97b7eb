//! Chat widget endpoints.
//!
//! - POST   /api/chat             - Run one exchange
//! - GET    /api/chat?sessionId=  - Read history
//! - DELETE /api/chat?sessionId=  - Clear history

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use serde::Deserialize;

use parley_types::chat::{ExchangeOutcome, HistoryView};
use parley_types::error::ChatError;

use crate::http::error::{AppError, Operation};
use crate::http::extractors::query::ChatQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Absent and blank both end up as a validation error.
    #[serde(default)]
    pub message: Option<String>,
    /// Existing session to continue; if absent, a new session id is minted.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/chat - Send a message and receive the assistant reply.
///
/// The exchange runs under a child of the server's shutdown token, so a
/// shutdown aborts the model call before anything is written.
pub async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<ApiResponse<ExchangeOutcome>, AppError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected chat request body");
        AppError::new(
            Operation::Exchange,
            ChatError::Validation("Invalid request body".to_string()),
        )
    })?;

    let cancel = state.shutdown.child_token();
    let outcome = state
        .chat_service
        .handle_exchange(
            request.session_id.as_deref(),
            request.message.as_deref().unwrap_or_default(),
            &cancel,
        )
        .await
        .map_err(|e| AppError::new(Operation::Exchange, e))?;

    Ok(ApiResponse::success(outcome))
}

/// GET /api/chat - Read the history of one session (or of every session in
/// broadcast scope).
pub async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<ChatQuery>, QueryRejection>,
) -> Result<ApiResponse<HistoryView>, AppError> {
    let query = chat_query(query, Operation::History)?;
    let view = state
        .chat_service
        .history(query.session_id.as_deref())
        .await
        .map_err(|e| AppError::new(Operation::History, e))?;

    Ok(ApiResponse::success(view))
}

/// DELETE /api/chat - Clear one session (or every session in broadcast scope).
pub async fn clear_history(
    State(state): State<AppState>,
    query: Result<Query<ChatQuery>, QueryRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let query = chat_query(query, Operation::Clear)?;
    let service = &state.chat_service;
    let target = service
        .clear_target(query.session_id.as_deref())
        .map_err(|e| AppError::new(Operation::Clear, e))?;
    service
        .clear(target)
        .await
        .map_err(|e| AppError::new(Operation::Clear, e))?;

    Ok(ApiResponse::message("Chat history cleared successfully"))
}

/// Unwrap the `?sessionId=` query, turning a rejection into the JSON error shape.
fn chat_query(
    query: Result<Query<ChatQuery>, QueryRejection>,
    operation: Operation,
) -> Result<ChatQuery, AppError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected chat query string");
        AppError::new(
            operation,
            ChatError::Validation("Invalid query string".to_string()),
        )
    })?;
    Ok(query)
}
