//! JSON-RPC framing over websocket frames.
//!
//! Unlike stdio transports there is no `Content-Length` header: each JSON-RPC message travels
//! as exactly one text frame. Binary frames are accepted when they carry UTF-8 JSON.

use serde_json::Value;
use std::io::{self, Read, Write};
use tungstenite::{Message, WebSocket};

/// Encode a JSON-RPC message as a text frame.
pub fn encode_frame(value: &Value) -> Message {
    Message::text(value.to_string())
}

/// Decode a frame.
///
/// Returns:
/// - `Ok(Some(value))` for a data frame carrying JSON.
/// - `Ok(None)` for control frames (ping, pong, close).
pub fn decode_frame(message: &Message) -> io::Result<Option<Value>> {
    let body: &[u8] = match message {
        Message::Text(text) => text.as_str().as_bytes(),
        Message::Binary(data) => &data[..],
        _ => return Ok(None),
    };
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

/// Write a single JSON-RPC message to `socket`.
pub fn write_lsp_message<S: Read + Write>(
    socket: &mut WebSocket<S>,
    value: &Value,
) -> Result<(), tungstenite::Error> {
    socket.send(encode_frame(value))
}
