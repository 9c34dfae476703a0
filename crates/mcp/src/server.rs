//! The stdio transport: newline-delimited JSON-RPC on stdin/stdout.
//! stdout carries protocol frames only; all logging goes to stderr.

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::protocol::{
    error_codes, CallToolParams, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    ServerCapabilities, ServerInfo, ToolsCapability, PROTOCOL_VERSION,
};

pub const SERVER_NAME: &str = "opend-mcp";

pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Serve until stdin closes, then release the gateway sessions.
    pub async fn run(mut self) -> io::Result<()> {
        let mut lines = BufReader::new(io::stdin()).lines();
        let mut stdout = io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let mut frame = serde_json::to_vec(&response).map_err(io::Error::other)?;
            frame.push(b'\n');
            stdout.write_all(&frame).await?;
            stdout.flush().await?;
        }

        debug!("stdin closed, shutting down");
        self.dispatcher.close().await;
        Ok(())
    }

    /// Handle one incoming line. Returns `None` for notifications.
    async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let req: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("parse error: {e}"),
                ));
            }
        };

        if req.is_notification() {
            debug!(method = %req.method, "notification ignored");
            return None;
        }
        let id = req.id.clone().unwrap_or(Value::Null);

        let response = match req.method.as_str() {
            "initialize" => match serde_json::to_value(Self::initialize_result()) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::failure(
                    id,
                    error_codes::INTERNAL_ERROR,
                    format!("initialize: {e}"),
                ),
            },
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => match serde_json::to_value(self.dispatcher.list_tools()) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::failure(
                    id,
                    error_codes::INTERNAL_ERROR,
                    format!("tools/list: {e}"),
                ),
            },
            "tools/call" => {
                let params: CallToolParams =
                    match serde_json::from_value(req.params.unwrap_or(Value::Null)) {
                        Ok(p) => p,
                        Err(e) => {
                            return Some(JsonRpcResponse::failure(
                                id,
                                error_codes::INVALID_PARAMS,
                                format!("tools/call params: {e}"),
                            ));
                        }
                    };
                let result = self.dispatcher.call_tool(params).await;
                match serde_json::to_value(result) {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(e) => JsonRpcResponse::failure(
                        id,
                        error_codes::INTERNAL_ERROR,
                        format!("tools/call: {e}"),
                    ),
                }
            }
            other => JsonRpcResponse::failure(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("method not supported: {other}"),
            ),
        };
        Some(response)
    }

    fn initialize_result() -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION,
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME,
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}
