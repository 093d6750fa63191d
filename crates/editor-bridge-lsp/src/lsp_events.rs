//! Typed views of inbound JSON-RPC messages.
//!
//! Only what the connector acts on is parsed: responses to its own requests, server->client
//! requests (answered with defaults), diagnostics and the two `window/*` message notifications.

use serde_json::Value;

/// LSP `MessageType` used by `window/showMessage` and `window/logMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LspMessageType {
    /// An error message.
    Error,
    /// A warning message.
    Warning,
    /// An informational message.
    Info,
    /// A log message (lowest severity).
    Log,
}

impl LspMessageType {
    /// Convert the numeric LSP `MessageType` into an enum.
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Info),
            4 => Some(Self::Log),
            _ => None,
        }
    }
}

/// Severity levels for `textDocument/publishDiagnostics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LspDiagnosticSeverity {
    /// Error diagnostics.
    Error,
    /// Warning diagnostics.
    Warning,
    /// Informational diagnostics.
    Information,
    /// Hint diagnostics.
    Hint,
}

impl LspDiagnosticSeverity {
    /// Convert the numeric LSP `DiagnosticSeverity` into an enum.
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Information),
            4 => Some(Self::Hint),
            _ => None,
        }
    }
}

/// LSP position: 0-based line, UTF-16 code unit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspPosition {
    /// Line (0-based).
    pub line: u32,
    /// Character offset (UTF-16 code units, 0-based).
    pub character: u32,
}

/// LSP range (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspRange {
    /// Start.
    pub start: LspPosition,
    /// End.
    pub end: LspPosition,
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct LspDiagnostic {
    /// Diagnostic range.
    pub range: LspRange,
    /// Optional severity.
    pub severity: Option<LspDiagnosticSeverity>,
    /// Optional code (number or string).
    pub code: Option<Value>,
    /// Optional source (e.g. "rust-analyzer").
    pub source: Option<String>,
    /// Message.
    pub message: String,
}

/// Parameters for `textDocument/publishDiagnostics`.
#[derive(Debug, Clone, PartialEq)]
pub struct LspPublishDiagnosticsParams {
    /// Document URI as sent by the server.
    pub uri: String,
    /// Diagnostics for the document (replaces any previous set).
    pub diagnostics: Vec<LspDiagnostic>,
}

/// Server->client notifications the connector handles.
#[derive(Debug, Clone, PartialEq)]
pub enum LspNotification {
    /// `window/showMessage`
    ShowMessage(LspMessageType, String),
    /// `window/logMessage`
    LogMessage(LspMessageType, String),
    /// `textDocument/publishDiagnostics`
    PublishDiagnostics(LspPublishDiagnosticsParams),
}

impl LspNotification {
    /// Parse a notification by method name and `params` payload.
    pub fn from_method_and_params(method: &str, params: &Value) -> Option<Self> {
        match method {
            "window/showMessage" | "window/logMessage" => {
                let typ = params
                    .get("type")?
                    .as_u64()
                    .and_then(LspMessageType::from_u64)?;
                let message = params.get("message")?.as_str()?.to_string();
                Some(if method == "window/showMessage" {
                    Self::ShowMessage(typ, message)
                } else {
                    Self::LogMessage(typ, message)
                })
            }
            "textDocument/publishDiagnostics" => {
                let uri = params.get("uri")?.as_str()?.to_string();
                let diagnostics = params
                    .get("diagnostics")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(diagnostic_from_value).collect())
                    .unwrap_or_default();
                Some(Self::PublishDiagnostics(LspPublishDiagnosticsParams {
                    uri,
                    diagnostics,
                }))
            }
            _ => None,
        }
    }
}

fn position_from_value(value: &Value) -> Option<LspPosition> {
    let line = value.get("line")?.as_u64()? as u32;
    let character = value.get("character")?.as_u64()? as u32;
    Some(LspPosition { line, character })
}

fn range_from_value(value: &Value) -> Option<LspRange> {
    let start = position_from_value(value.get("start")?)?;
    let end = position_from_value(value.get("end")?)?;
    Some(LspRange { start, end })
}

fn diagnostic_from_value(value: &Value) -> Option<LspDiagnostic> {
    Some(LspDiagnostic {
        range: range_from_value(value.get("range")?)?,
        severity: value
            .get("severity")
            .and_then(Value::as_u64)
            .and_then(LspDiagnosticSeverity::from_u64),
        code: value.get("code").filter(|code| !code.is_null()).cloned(),
        source: value.get("source").and_then(Value::as_str).map(str::to_string),
        message: value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    })
}

/// A JSON-RPC response error object.
#[derive(Debug, Clone, PartialEq)]
pub struct LspResponseError {
    /// Error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

/// One inbound JSON-RPC message, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Response to a client request.
    Response {
        /// Request id.
        id: u64,
        /// Result payload, `Null` on error.
        result: Value,
        /// Error payload.
        error: Option<LspResponseError>,
    },
    /// Server->client request; must be answered.
    Request {
        /// Request id.
        id: u64,
        /// Method name.
        method: String,
        /// Params payload.
        params: Value,
    },
    /// Server->client notification.
    Notification {
        /// Method name.
        method: String,
        /// Params payload.
        params: Value,
    },
}

impl InboundMessage {
    /// Classify a raw message. `None` for values that are not JSON-RPC messages.
    pub fn from_json(msg: &Value) -> Option<Self> {
        let params = || msg.get("params").cloned().unwrap_or(Value::Null);
        let id = msg.get("id").and_then(Value::as_u64);
        match (msg.get("method").and_then(Value::as_str), id) {
            (Some(method), Some(id)) => Some(Self::Request {
                id,
                method: method.to_string(),
                params: params(),
            }),
            (Some(method), None) => Some(Self::Notification {
                method: method.to_string(),
                params: params(),
            }),
            (None, Some(id)) => {
                let error = msg.get("error").map(|error| LspResponseError {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                });
                Some(Self::Response {
                    id,
                    result: msg.get("result").cloned().unwrap_or(Value::Null),
                    error,
                })
            }
            (None, None) => None,
        }
    }
}
