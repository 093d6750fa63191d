#![warn(missing_docs)]
//! `editor-bridge-lsp` - language service connector for `editor-bridge`.
//!
//! A language server is reached through a websocket to a process launcher. The launcher gets a
//! handshake frame naming the server command line, then JSON-RPC flows one message per text
//! frame. Socket I/O runs on a background thread; everything else (requests, document sync,
//! diagnostics to markers) runs on the caller's thread inside
//! [`LanguageServiceConnector::poll`].
//!
//! ```no_run
//! use editor_bridge::{BridgeConfig, BridgeContext, HostEventLog};
//! use editor_bridge_lsp::{ConnectRequest, LanguageServiceConnector};
//! use std::rc::Rc;
//!
//! let config = BridgeConfig::default();
//! let mut ctx = BridgeContext::new(config.clone(), Rc::new(HostEventLog::new()));
//! let mut connector = LanguageServiceConnector::new(&config);
//! connector.connect(ConnectRequest {
//!     url: "ws://127.0.0.1:8080/".to_string(),
//!     launch_args: vec!["rust-analyzer".to_string()],
//!     working_directory_bookmark: String::new(),
//!     language: "rust".to_string(),
//!     workspace_root: Some("/home/dev/project".to_string()),
//! });
//! loop {
//!     connector.poll(&mut ctx);
//!     std::thread::sleep(std::time::Duration::from_millis(20));
//! }
//! ```

pub mod connector;
pub mod error;
pub mod lsp_client;
pub mod lsp_events;
pub mod lsp_sync;
pub mod lsp_transport;
pub mod lsp_uri;
pub mod socket;

pub use connector::{ConnectRequest, ConnectionId, LanguageServiceConnector};
pub use error::ConnectorError;
pub use lsp_client::LspClient;
pub use lsp_events::{
    InboundMessage, LspDiagnostic, LspDiagnosticSeverity, LspMessageType, LspNotification,
    LspPublishDiagnosticsParams,
};
pub use lsp_sync::{DocumentSync, DocumentTracker, diagnostics_to_markers, utf16_to_char_offset};
pub use lsp_transport::{decode_frame, encode_frame};
pub use lsp_uri::{document_uri, path_to_file_uri, root_uri};
pub use socket::{ConnectionState, Socket, SocketCommand, SocketEvent, SocketOptions};
