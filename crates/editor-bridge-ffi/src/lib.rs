#![warn(missing_docs)]
//! `editor-bridge-ffi` - the host boundary of `editor-bridge`.
//!
//! Three layers, each built on the one before:
//!
//! - [`Bridge`]: the boundary as a Rust API. Text and URIs arrive base64-encoded, exactly as the
//!   host sends them, and the language service connector is kept in sync after every call.
//! - [`Call`]: the same calls as tagged JSON documents, for hosts that talk in strings.
//! - [`c_api`]: a C ABI over [`Call`], with notifications delivered to a callback as JSON.
//!
//! ```rust
//! use editor_bridge::{BridgeConfig, HostEventLog, encode_base64};
//! use editor_bridge_ffi::Bridge;
//! use std::rc::Rc;
//!
//! let log = Rc::new(HostEventLog::new());
//! let mut bridge = Bridge::new(BridgeConfig::default(), log.clone());
//! bridge
//!     .create_or_update_model(&encode_base64("file:///a.txt"), &encode_base64("hello\n"))
//!     .unwrap();
//! assert_eq!(
//!     bridge.context().active_model().map(|uri| uri.as_str()),
//!     Some("file:///a.txt")
//! );
//! ```

mod bridge;
pub mod c_api;
mod call;
mod error;

pub use bridge::Bridge;
pub use call::Call;
pub use error::FfiError;
