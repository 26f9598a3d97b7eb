//! Application error type mapping to HTTP status codes and the error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::ChatError;

/// Which endpoint family failed. Picks the stable message for 500s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Exchange,
    History,
    Clear,
    Sessions,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Operation::Exchange => "Failed to process message",
            Operation::History => "Failed to fetch chat history",
            Operation::Clear => "Failed to clear chat history",
            Operation::Sessions => "Failed to fetch chat sessions",
        }
    }
}

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub struct AppError {
    pub operation: Operation,
    pub source: ChatError,
}

impl AppError {
    pub fn new(operation: Operation, source: ChatError) -> Self {
        Self { operation, source }
    }

    /// Status, category code, and client-facing message.
    ///
    /// Validation text is written for the client and passes through as-is;
    /// upstream and store detail stays in the logs.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        let code = self.source.code();
        match &self.source {
            ChatError::Validation(msg) => (StatusCode::BAD_REQUEST, code, msg.clone()),
            ChatError::NotFound(_) => (StatusCode::NOT_FOUND, code, "Session not found".to_string()),
            ChatError::Upstream(_) | ChatError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                code,
                self.operation.failure_message().to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
