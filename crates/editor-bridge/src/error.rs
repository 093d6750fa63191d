//! Errors surfaced across the host boundary.

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors surfaced to the host.
///
/// Operations that reference a missing model or surface never produce an error; they are
/// silent no-ops. Everything here is either a malformed boundary payload or a request that
/// would corrupt model identity.
pub enum BridgeError {
    #[error("invalid base64 payload: {0}")]
    /// A boundary argument was not valid base64.
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8: {0}")]
    /// A decoded boundary argument was not valid UTF-8.
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid JSON payload: {0}")]
    /// A JSON argument (theme, edits, markers, config) failed to parse.
    Json(#[from] serde_json::Error),

    #[error("a model already exists for '{0}'")]
    /// A rename targeted a URI that already has a model.
    ModelAlreadyExists(String),

    #[error("edit ranges overlap")]
    /// An edit batch contained overlapping ranges.
    OverlappingEdits,

    #[error("unknown color scheme '{0}'")]
    /// The color scheme was neither `dark` nor `light`.
    UnknownColorScheme(String),
}
