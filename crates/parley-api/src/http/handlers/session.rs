//! Session browsing endpoints.
//!
//! - GET /api/chat/sessions      - Summaries, most recently updated first
//! - GET /api/chat/sessions/{id} - One full session, or 404

use axum::extract::{Path, State};

use parley_types::chat::{ChatSession, SessionSummary};

use crate::http::error::{AppError, Operation};
use crate::http::response::ApiResponse;
use crate::state::AppState;

pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<SessionSummary>>, AppError> {
    let sessions = state
        .chat_service
        .list_sessions()
        .await
        .map_err(|e| AppError::new(Operation::Sessions, e))?;

    Ok(ApiResponse::success(sessions))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let session = state
        .chat_service
        .get_session(&session_id)
        .await
        .map_err(|e| AppError::new(Operation::Sessions, e))?;

    Ok(ApiResponse::success(session))
}
