use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use super::types::{
    CallToolParams, InitializeResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND,
    PARSE_ERROR,
};
use crate::models::AuthContext;
use crate::tools::{ToolError, Toolbox};

/// Transport-independent MCP dispatcher. Both stdio and HTTP feed raw
/// JSON-RPC text in and write whatever comes back out.
#[derive(Clone)]
pub struct McpServer {
    toolbox: Toolbox,
}

impl McpServer {
    pub fn new(toolbox: Toolbox) -> Self {
        McpServer { toolbox }
    }

    /// Handles one JSON-RPC message. Notifications yield `None`.
    pub async fn handle_message(&self, raw: &str, auth: &AuthContext) -> Option<String> {
        let response = match serde_json::from_str::<Value>(raw) {
            Err(e) => Some(JsonRpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {e}"),
            )),
            Ok(value) => self.handle_value(value, auth).await,
        };
        response.map(|r| encode(&r))
    }

    async fn handle_value(&self, value: Value, auth: &AuthContext) -> Option<JsonRpcResponse> {
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ))
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            ));
        }

        if request.is_notification() {
            debug!(method = %request.method, "Notification received");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        debug!(method = %request.method, "Request received");
        Some(match self.dispatch(&request, auth).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::failure(id, code, message),
        })
    }

    async fn dispatch(
        &self,
        request: &JsonRpcRequest,
        auth: &AuthContext,
    ) -> Result<Value, (i64, String)> {
        match request.method.as_str() {
            "initialize" => to_value(&InitializeResult::default()),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(&ListToolsResult {
                tools: Toolbox::definitions(),
            }),
            "tools/call" => {
                let params: CallToolParams = serde_json::from_value(request.params.clone())
                    .map_err(|e| (INVALID_PARAMS, format!("Invalid params: {e}")))?;
                let arguments = match params.arguments {
                    Value::Null => json!({}),
                    other => other,
                };
                match self.toolbox.call(&params.name, &arguments, auth).await {
                    Ok(output) => to_value(&output),
                    Err(e @ ToolError::UnknownTool(_)) | Err(e @ ToolError::InvalidParams(_)) => {
                        warn!(tool = %params.name, "Rejected tool call: {e}");
                        Err((INVALID_PARAMS, e.to_string()))
                    }
                    Err(ToolError::Failed(message)) => Err((INTERNAL_ERROR, message)),
                }
            }
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, (i64, String)> {
    serde_json::to_value(value).map_err(|e| (INTERNAL_ERROR, e.to_string()))
}

fn encode(response: &JsonRpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        error!("Failed to encode response: {e}");
        json!({
            "jsonrpc": "2.0",
            "id": Value::Null,
            "error": { "code": INTERNAL_ERROR, "message": "Failed to encode response" },
        })
        .to_string()
    })
}
