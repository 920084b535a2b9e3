//! MCP (JSON-RPC 2.0) front end for the operation catalog.

pub mod http;
pub mod stdio;

use crate::catalog::Catalog;
use crate::normalize::Lookup;
use crate::error::LookupError;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "aiwen_ip_geo";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// How the server talks to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportMode {
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
    /// JSON-RPC over HTTP POST.
    Http,
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// `None` only when the field is absent; `"id": null` is `Some(Null)`.
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Protocol handler shared by every transport.
pub struct McpServer {
    catalog: Arc<Catalog>,
}

impl McpServer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_raw(&self, payload: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(payload) {
            Ok(message) => self.handle(message).await,
            Err(e) => Some(error_message(
                Value::Null,
                PARSE_ERROR,
                &format!("invalid JSON: {}", e),
            )),
        }
    }

    /// Handle one parsed message. Returns `None` for notifications.
    pub async fn handle(&self, message: Value) -> Option<Value> {
        let raw_id = message.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return Some(error_message(
                    raw_id,
                    INVALID_REQUEST,
                    &format!("invalid request: {}", e),
                ))
            }
        };

        debug!(method = %request.method, "Handling request");

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(request.params).await,
            method if method.starts_with("notifications/") => return None,
            other => Err((METHOD_NOT_FOUND, format!("unsupported method '{}'", other))),
        };

        // Requests without an id are notifications and get no reply.
        let id = request.id?;
        Some(match outcome {
            Ok(result) => result_message(id, result),
            Err((code, message)) => error_message(id, code, &message),
        })
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {
                "tools": {},
            },
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .catalog
            .tools()
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, (i64, String)> {
        let params: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| (INVALID_PARAMS, format!("invalid tools/call params: {}", e)))?;

        let result = self.catalog.call(&params.name, &params.arguments).await;
        if let Err(ref e) = result {
            warn!(tool = %params.name, error = %e, "Tool call failed");
        }
        Ok(tool_result(result))
    }
}

/// Render a lookup outcome as an MCP tool result.
pub fn tool_result(result: Result<Lookup, LookupError>) -> Value {
    match result {
        Ok(lookup) => {
            let mut content = vec![json!({ "type": "text", "text": lookup.to_text() })];
            if let Some(caveat) = &lookup.caveat {
                content.push(json!({ "type": "text", "text": format!("Note: {}", caveat) }));
            }
            json!({ "content": content, "isError": false })
        }
        Err(e) => json!({
            "content": [{ "type": "text", "text": format!("Error: {}", e) }],
            "isError": true,
        }),
    }
}

fn result_message(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_message(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}
