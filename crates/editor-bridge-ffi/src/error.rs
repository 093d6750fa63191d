//! Errors returned by boundary calls.

use editor_bridge::BridgeError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned across the host boundary.
pub enum FfiError {
    #[error(transparent)]
    /// The core rejected the call.
    Bridge(#[from] BridgeError),

    #[error("malformed call: {0}")]
    /// A JSON call document did not parse.
    Call(#[from] serde_json::Error),

    #[error("null pointer passed for '{0}'")]
    /// A required C argument was null.
    NullArgument(&'static str),

    #[error("argument '{0}' is not valid UTF-8")]
    /// A C string argument was not UTF-8.
    InvalidUtf8(&'static str),

    #[error("call panicked: {0}")]
    /// The bridge panicked while handling a C call.
    Panic(String),
}
