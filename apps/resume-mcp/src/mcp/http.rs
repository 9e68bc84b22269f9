use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use std::sync::Arc;

use super::McpServer;
use crate::models::AuthContext;

/// POST /mcp
/// One JSON-RPC message per request. Notifications are acknowledged with 202.
pub async fn mcp_handler(
    State(server): State<Arc<McpServer>>,
    Extension(auth): Extension<AuthContext>,
    body: String,
) -> Response {
    match server.handle_message(&body, &auth).await {
        Some(reply) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            reply,
        )
            .into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// GET/DELETE /mcp
/// No server-initiated streams or sessions are offered.
pub async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}
