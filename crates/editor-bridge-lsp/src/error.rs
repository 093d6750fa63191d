//! Connector errors.

use thiserror::Error;

/// Errors raised while opening or driving a language service connection.
///
/// Most of these never reach the host: the I/O thread logs them and the connection moves to
/// [`ConnectionState::Closed`](crate::ConnectionState::Closed).
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Only plain `ws://` endpoints are supported.
    #[error("unsupported language service url: {0}")]
    UnsupportedUrl(String),

    /// Socket-level failure.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// Websocket protocol failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The websocket opening handshake did not complete.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// A frame could not be encoded or decoded.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}
