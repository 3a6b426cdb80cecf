//! MCP over stdio: newline-delimited JSON-RPC 2.0.
//!
//! Tool calls run one at a time on the blocking pool; the gateway is blocking.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use calmcp_core::CalendarGateway;
use calmcp_core::tools::CalendarTools;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::tools::{self, CallError};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
struct Request {
    /// Absent for notifications
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn failure(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

fn text_result(text: &str, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

pub struct Server<G> {
    tools: Arc<Mutex<CalendarTools<G>>>,
}

impl<G: CalendarGateway + Send + 'static> Server<G> {
    pub fn new(tools: CalendarTools<G>) -> Self {
        Server {
            tools: Arc::new(Mutex::new(tools)),
        }
    }

    /// Serve requests from stdin until it closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        info!("serving MCP on stdio");

        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            // Skip empty lines
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut out = response.to_string();
                out.push('\n');
                stdout
                    .write_all(out.as_bytes())
                    .await
                    .context("Failed to write response")?;
                stdout.flush().await.context("Failed to flush stdout")?;
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one line of input. Notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let request: Request = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "unparseable request");
                return Some(failure(
                    Value::Null,
                    PARSE_ERROR,
                    &format!("Failed to parse request: {}", e),
                ));
            }
        };

        let Some(id) = request.id else {
            debug!(method = %request.method, "notification");
            return None;
        };

        Some(match request.method.as_str() {
            "initialize" => success(id, initialize_result(&request.params)),
            "ping" => success(id, json!({})),
            "tools/list" => success(id, json!({ "tools": tools::tool_defs() })),
            "tools/call" => self.call_tool(id, request.params).await,
            other => failure(id, METHOD_NOT_FOUND, &format!("Method not found: {}", other)),
        })
    }

    async fn call_tool(&self, id: Value, params: Value) -> Value {
        let params: CallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                return failure(id, INVALID_PARAMS, &format!("Invalid tools/call params: {}", e));
            }
        };

        info!(tool = %params.name, "tool call");

        let shared = Arc::clone(&self.tools);
        let outcome = tokio::task::spawn_blocking(move || {
            let guard = shared.lock().unwrap_or_else(|p| p.into_inner());
            tools::call(&*guard, &params.name, params.arguments)
        })
        .await;

        match outcome {
            Ok(Ok(text)) => success(id, text_result(&text, false)),
            Ok(Err(e @ CallError::InvalidArguments { .. })) => {
                success(id, text_result(&e.to_string(), true))
            }
            Ok(Err(e @ CallError::UnknownTool(_))) => failure(id, INVALID_PARAMS, &e.to_string()),
            Err(e) => {
                warn!(error = %e, "tool task failed");
                failure(id, INTERNAL_ERROR, "Tool call failed")
            }
        }
    }
}

fn initialize_result(params: &Value) -> Value {
    // Echo the client's protocol version when it sends one
    let version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);

    json!({
        "protocolVersion": version,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calmcp_core::memory::{MemoryGateway, event_ics};

    fn server() -> Server<MemoryGateway> {
        let gateway = MemoryGateway::new().with_calendar("Personal");
        gateway.add_item("Personal", event_ics("e1", "Dentist", "20250322T150000", None));
        Server::new(CalendarTools::new(gateway))
    }

    #[tokio::test]
    async fn test_initialize_and_notifications() {
        let server = server();

        let response = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#,
            )
            .await
            .unwrap();
        assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(response["result"]["serverInfo"]["name"], "calmcp");

        let none = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_tools_list_exposes_schemas() {
        let response = server()
            .handle_line(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
            .await
            .unwrap();

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 15);
        let create = tools
            .iter()
            .find(|t| t["name"] == "create_calendar_event")
            .unwrap();
        assert_eq!(create["inputSchema"]["type"], "object");
        assert_eq!(create["inputSchema"]["required"][0], "calendar_name");
    }

    #[tokio::test]
    async fn test_tools_call_returns_text_content() {
        let response = server()
            .handle_line(
                r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"delete_calendar_event","arguments":{"calendar_name":"Personal","event_summary":"Dentist"}}}"#,
            )
            .await
            .unwrap();

        assert_eq!(response["id"], 7);
        assert_eq!(response["result"]["isError"], false);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Event 'Dentist' deleted successfully from calendar 'Personal'"
        );
    }

    #[tokio::test]
    async fn test_missing_arguments_are_tool_errors() {
        let response = server()
            .handle_line(
                r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"create_todo","arguments":{"calendar_name":"Personal"}}}"#,
            )
            .await
            .unwrap();

        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Invalid arguments for create_todo:"), "got: {}", text);
        assert!(text.contains("summary"));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();

        let response = server.handle_line("{not json").await.unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);
        assert_eq!(response["id"], Value::Null);

        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);

        let response = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope"}}"#,
            )
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }
}
