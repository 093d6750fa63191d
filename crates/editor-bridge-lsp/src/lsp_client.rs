//! Minimal JSON-RPC/LSP client over the connector's socket.
//!
//! Runtime-agnostic: messages are handed to the socket's I/O thread through a channel and
//! responses come back through [`crate::LanguageServiceConnector::poll`].

use crate::socket::SocketCommand;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::io;
use std::sync::mpsc;

/// Writes requests, notifications and responses and remembers which method each pending
/// request id belongs to.
#[derive(Debug)]
pub struct LspClient {
    tx: mpsc::Sender<SocketCommand>,
    next_id: u64,
    pending: HashMap<u64, String>,
    workspace_folders: Vec<Value>,
}

impl LspClient {
    /// Create a client writing through `tx`.
    pub fn new(tx: mpsc::Sender<SocketCommand>, workspace_folders: Vec<Value>) -> Self {
        Self {
            tx,
            next_id: 1,
            pending: HashMap::new(),
            workspace_folders,
        }
    }

    /// Send a JSON-RPC notification to the server.
    pub fn notify(&self, method: &str, params: Value) -> io::Result<()> {
        self.send_message(json_rpc_notification(method, params))
    }

    /// Send a JSON-RPC request to the server and return the allocated request id.
    pub fn request(&mut self, method: &str, params: Value) -> io::Result<u64> {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);

        self.send_message(json_rpc_request(id, method, params))?;
        self.pending.insert(id, method.to_string());
        Ok(id)
    }

    /// Forget a pending request, returning the method it was sent with.
    pub fn complete(&mut self, id: u64) -> Option<String> {
        self.pending.remove(&id)
    }

    /// Number of requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Send a successful JSON-RPC response for a server-initiated request.
    pub fn respond(&self, id: u64, result: Value) -> io::Result<()> {
        self.send_message(json_rpc_response(id, result))
    }

    /// Send an error JSON-RPC response for a server-initiated request.
    pub fn respond_error(&self, id: u64, code: i64, message: impl Into<String>) -> io::Result<()> {
        self.send_message(json_rpc_error_response(id, code, message.into()))
    }

    fn send_message(&self, message: Value) -> io::Result<()> {
        self.tx
            .send(SocketCommand::Send(message))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "socket thread stopped"))
    }

    /// Respond to a server->client request with a safe default.
    ///
    /// The bridge has no UI to put prompts or edits in front of, so everything that would
    /// need one is declined.
    pub fn handle_server_request(&self, id: u64, method: &str, params: &Value) -> io::Result<()> {
        let result = match method {
            "workspace/configuration" => {
                let item_count = params
                    .get("items")
                    .and_then(Value::as_array)
                    .map(Vec::len)
                    .unwrap_or(0);
                Value::Array(std::iter::repeat_n(Value::Null, item_count).collect())
            }
            "workspace/workspaceFolders" => {
                if self.workspace_folders.is_empty() {
                    Value::Null
                } else {
                    Value::Array(self.workspace_folders.clone())
                }
            }
            "workspace/applyEdit" => json!({
                "applied": false,
                "failureReason": "editor-bridge does not apply server edits",
            }),
            "client/registerCapability"
            | "client/unregisterCapability"
            | "window/workDoneProgress/create"
            | "window/showMessageRequest"
            | "workspace/semanticTokens/refresh"
            | "workspace/inlayHint/refresh"
            | "workspace/codeLens/refresh"
            | "workspace/diagnostic/refresh" => Value::Null,
            _ => {
                tracing::debug!(method, "unsupported server request");
                return self.respond_error(id, -32601, format!("unhandled method {method}"));
            }
        };

        self.respond(id, result)
    }
}

fn envelope() -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("jsonrpc".to_string(), Value::String("2.0".to_string()));
    obj
}

fn json_rpc_notification(method: &str, params: Value) -> Value {
    let mut obj = envelope();
    obj.insert("method".to_string(), Value::String(method.to_string()));
    obj.insert("params".to_string(), params);
    Value::Object(obj)
}

fn json_rpc_request(id: u64, method: &str, params: Value) -> Value {
    let mut obj = envelope();
    obj.insert("id".to_string(), Value::Number(id.into()));
    obj.insert("method".to_string(), Value::String(method.to_string()));
    obj.insert("params".to_string(), params);
    Value::Object(obj)
}

fn json_rpc_response(id: u64, result: Value) -> Value {
    let mut obj = envelope();
    obj.insert("id".to_string(), Value::Number(id.into()));
    obj.insert("result".to_string(), result);
    Value::Object(obj)
}

fn json_rpc_error_response(id: u64, code: i64, message: String) -> Value {
    let mut obj = envelope();
    obj.insert("id".to_string(), Value::Number(id.into()));
    obj.insert("error".to_string(), json!({ "code": code, "message": message }));
    Value::Object(obj)
}
