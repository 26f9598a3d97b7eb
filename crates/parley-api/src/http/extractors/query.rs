//! Query parameter extractors.

use serde::Deserialize;

/// `?sessionId=` on `GET` and `DELETE /api/chat`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatQuery {
    pub session_id: Option<String>,
}
