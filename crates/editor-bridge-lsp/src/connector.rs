//! Language service connector.
//!
//! Holds at most one connection. Connecting again closes the previous socket first. All
//! protocol state is driven from [`LanguageServiceConnector::poll`] on the caller's thread.

use crate::lsp_client::LspClient;
use crate::lsp_events::{InboundMessage, LspMessageType, LspNotification};
use crate::lsp_sync::{DocumentTracker, diagnostics_to_markers};
use crate::lsp_uri::{root_uri, workspace_folder};
use crate::socket::{ConnectionState, Socket, SocketEvent, SocketOptions};
use editor_bridge::{BridgeConfig, BridgeContext, ModelUri};
use serde_json::{Value, json};
use std::time::Duration;

/// Identifies one `connect` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Arguments of a `connect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// `ws://` endpoint of the process launcher.
    pub url: String,
    /// Command line for the language server.
    pub launch_args: Vec<String>,
    /// Opaque working-directory bookmark passed through to the launcher.
    pub working_directory_bookmark: String,
    /// Language id; only models with this language are synced.
    pub language: String,
    /// Workspace root (path or URI).
    pub workspace_root: Option<String>,
}

impl ConnectRequest {
    /// The first frame the launcher receives.
    pub fn handshake(&self) -> Value {
        json!({
            "args": self.launch_args,
            "redirectStderr": false,
            "workingDirectoryBookmark": self.working_directory_bookmark,
            "isLanguageService": true,
        })
    }
}

#[derive(Debug)]
struct ActiveConnection {
    id: ConnectionId,
    request: ConnectRequest,
    socket: Socket,
    client: Option<LspClient>,
    initialize_id: Option<u64>,
    initialized: bool,
    documents: DocumentTracker,
}

impl ActiveConnection {
    /// Whether the protocol client was started (the connection reached `Ready`).
    fn started(&self) -> bool {
        self.client.is_some()
    }
}

/// Connects the bridge to one external language service.
#[derive(Debug)]
pub struct LanguageServiceConnector {
    handshake_delay: Duration,
    poll_interval: Duration,
    client_name: String,
    baseline_prefix: String,
    next_id: u64,
    active: Option<ActiveConnection>,
    last_state: ConnectionState,
    dropped: Vec<String>,
}

impl LanguageServiceConnector {
    /// Create a connector using the timing and naming settings of `config`.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            handshake_delay: config.handshake_delay(),
            poll_interval: config.socket_poll_interval(),
            client_name: config.client_name.clone(),
            baseline_prefix: config.baseline_prefix.clone(),
            next_id: 0,
            active: None,
            last_state: ConnectionState::Disconnected,
            dropped: Vec::new(),
        }
    }

    /// Open a connection, closing any existing one first.
    pub fn connect(&mut self, request: ConnectRequest) -> ConnectionId {
        self.disconnect();

        self.next_id += 1;
        let id = ConnectionId(self.next_id);
        tracing::info!(
            connection = id.0,
            url = %request.url,
            language = %request.language,
            "connecting language service"
        );
        let socket = Socket::open(SocketOptions {
            url: request.url.clone(),
            handshake: request.handshake(),
            handshake_delay: self.handshake_delay,
            poll_interval: self.poll_interval,
        });
        self.active = Some(ActiveConnection {
            id,
            request,
            socket,
            client: None,
            initialize_id: None,
            initialized: false,
            documents: DocumentTracker::new(),
        });
        id
    }

    /// Close the connection if there is one. Safe to call when there is none.
    pub fn disconnect(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        tracing::debug!(connection = active.id.0, "closing language service connection");
        active.socket.close();
        self.retire(active);
    }

    /// Whether a socket exists and is open. Never blocks.
    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        match &self.active {
            Some(active) => active.socket.state(),
            None => self.last_state,
        }
    }

    /// Id of the live connection.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Language of the live connection.
    pub fn language(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|active| active.request.language.as_str())
    }

    /// Number of documents open on the server.
    pub fn open_documents(&self) -> usize {
        self.active
            .as_ref()
            .map(|active| active.documents.len())
            .unwrap_or(0)
    }

    /// Drain socket events, drive the protocol client and sync documents.
    pub fn poll(&mut self, ctx: &mut BridgeContext) {
        while let Some(event) = self.active.as_ref().and_then(|active| active.socket.try_recv()) {
            match event {
                SocketEvent::State(ConnectionState::Ready) => self.start_client(),
                SocketEvent::State(ConnectionState::Closed) => {
                    if let Some(active) = self.active.take() {
                        self.retire(active);
                    }
                }
                SocketEvent::State(state) => tracing::debug!(?state, "language service state"),
                SocketEvent::Message(message) => self.handle_message(ctx, message),
                SocketEvent::Error(error) => {
                    tracing::warn!(error = %error, "language service error");
                }
            }
        }

        for language in self.dropped.drain(..) {
            ctx.language_service_dropped(&language);
        }
        self.sync_documents(ctx);
    }

    /// Send `didOpen`/`didChange`/`didClose` so the server matches the registry.
    pub fn sync_documents(&mut self, ctx: &BridgeContext) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let Some(client) = active.client.as_ref() else {
            return;
        };
        if !active.initialized {
            return;
        }
        let actions = active.documents.plan(
            ctx.registry(),
            &active.request.language,
            &self.baseline_prefix,
        );
        for action in actions {
            let (method, params) = action.to_notification();
            if let Err(err) = client.notify(method, params) {
                tracing::warn!(error = %err, method, "document sync failed");
                return;
            }
        }
    }

    fn retire(&mut self, active: ActiveConnection) {
        if active.started() {
            self.dropped.push(active.request.language.clone());
        }
        self.last_state = ConnectionState::Closed;
        tracing::debug!(connection = active.id.0, "language service connection closed");
    }

    fn start_client(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let root = active.request.workspace_root.as_deref().map(root_uri);
        let folders: Vec<Value> = root.iter().map(|uri| workspace_folder(uri)).collect();

        let mut client = LspClient::new(active.socket.sender(), folders.clone());
        let workspace_folders = if folders.is_empty() {
            Value::Null
        } else {
            Value::Array(folders)
        };
        let params = json!({
            "processId": std::process::id(),
            "clientInfo": {
                "name": self.client_name,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "rootUri": root,
            "workspaceFolders": workspace_folders,
            "capabilities": {
                "textDocument": {
                    "synchronization": { "dynamicRegistration": false, "didSave": false },
                    "publishDiagnostics": { "relatedInformation": false },
                },
                "workspace": { "workspaceFolders": true, "configuration": true },
            },
        });
        match client.request("initialize", params) {
            Ok(id) => active.initialize_id = Some(id),
            Err(err) => tracing::warn!(error = %err, "failed to send initialize"),
        }
        active.client = Some(client);
        tracing::debug!(connection = active.id.0, "language client started");
    }

    fn handle_message(&mut self, ctx: &mut BridgeContext, message: Value) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let Some(client) = active.client.as_mut() else {
            return;
        };
        let Some(inbound) = InboundMessage::from_json(&message) else {
            tracing::warn!("ignoring non JSON-RPC message from language service");
            return;
        };

        match inbound {
            InboundMessage::Response { id, error, .. } => {
                let method = client.complete(id);
                if let Some(error) = error {
                    tracing::warn!(
                        id,
                        ?method,
                        code = error.code,
                        reason = %error.message,
                        "language service request failed"
                    );
                    return;
                }
                if active.initialize_id == Some(id) {
                    if let Err(err) = client.notify("initialized", json!({})) {
                        tracing::warn!(error = %err, "failed to send initialized");
                        return;
                    }
                    active.initialized = true;
                    tracing::info!(language = %active.request.language, "language service ready");
                }
            }
            InboundMessage::Request { id, method, params } => {
                if let Err(err) = client.handle_server_request(id, &method, &params) {
                    tracing::warn!(error = %err, method = %method, "failed to answer server request");
                }
            }
            InboundMessage::Notification { method, params } => {
                match LspNotification::from_method_and_params(&method, &params) {
                    Some(LspNotification::PublishDiagnostics(diagnostics)) => {
                        let uri = ModelUri::parse(&diagnostics.uri);
                        let markers = diagnostics_to_markers(
                            ctx.registry().get(&uri),
                            &diagnostics.diagnostics,
                        );
                        let owner = active.request.language.clone();
                        ctx.set_model_markers(&owner, &uri, markers);
                    }
                    Some(LspNotification::ShowMessage(typ, text))
                    | Some(LspNotification::LogMessage(typ, text)) => match typ {
                        LspMessageType::Error => tracing::error!(target: "language_service", "{text}"),
                        LspMessageType::Warning => tracing::warn!(target: "language_service", "{text}"),
                        LspMessageType::Info => tracing::info!(target: "language_service", "{text}"),
                        LspMessageType::Log => tracing::debug!(target: "language_service", "{text}"),
                    },
                    None => tracing::trace!(method = %method, "unhandled notification"),
                }
            }
        }
    }
}

impl Drop for LanguageServiceConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}
