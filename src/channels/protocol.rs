//! Framing-independent request/response envelope.
//!
//! A small JSON-RPC 2.0 subset shared by both transports. Methods:
//! `tools/list`, `tools/call`, and `ping`. Tool failures are delivered as a
//! structured `{"error": …}` result over the normal response path; JSON-RPC
//! level errors are reserved for malformed envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::gateway::Gateway;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// An incoming request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outgoing response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl Response {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, code: i64, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(RpcError { code, message }),
        }
    }
}

/// Handle one request against the gateway.
///
/// Never fails: every outcome, including dispatch errors, is a well-formed
/// [`Response`].
pub async fn handle_request(gateway: &Gateway, request: Request) -> Response {
    match request.method.as_str() {
        "ping" => Response::success(request.id, json!({})),
        "tools/list" => Response::success(
            request.id,
            json!({ "tools": gateway.registry().definitions() }),
        ),
        "tools/call" => handle_call(gateway, request).await,
        other => Response::failure(
            request.id,
            METHOD_NOT_FOUND,
            format!("unknown method '{other}'"),
        ),
    }
}

async fn handle_call(gateway: &Gateway, request: Request) -> Response {
    let params = request.params.unwrap_or(Value::Null);

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Response::failure(request.id, INVALID_PARAMS, "missing tool name".to_string());
    };

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Response::failure(
                request.id,
                INVALID_PARAMS,
                "'arguments' must be an object".to_string(),
            );
        }
    };

    let result = match gateway.dispatch(name, arguments).await {
        Ok(result) => result.into_value(),
        // Dispatch failures flow back as structured error results, never as
        // transport-level errors or a dead session.
        Err(e) => {
            tracing::warn!(tool = name, error = %e, "tool call failed");
            json!({ "error": e.to_string() })
        }
    };

    Response::success(request.id, result)
}
