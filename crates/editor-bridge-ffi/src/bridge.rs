//! The host-facing facade.
//!
//! Every method takes its arguments the way hosts send them: model URIs and text as standard
//! base64, themes as base64 JSON, everything else plain. After each call the language service
//! connector is brought up to date with the model registry.

use crate::error::FfiError;
use editor_bridge::{
    BridgeConfig, BridgeContext, ColorScheme, HostNotifier, MarkerData, ModelUri, Position,
    SingleEdit, Theme, decode_base64,
};
use editor_bridge_lsp::{ConnectRequest, ConnectionId, ConnectionState, LanguageServiceConnector};
use std::rc::Rc;

fn decode_uri(encoded: &str) -> Result<ModelUri, FfiError> {
    Ok(ModelUri::parse(&decode_base64(encoded)?))
}

/// One embedded editor plus its language service connection.
pub struct Bridge {
    ctx: BridgeContext,
    connector: LanguageServiceConnector,
}

impl Bridge {
    /// Create a bridge that reports to `notifier`.
    pub fn new(config: BridgeConfig, notifier: Rc<dyn HostNotifier>) -> Self {
        let connector = LanguageServiceConnector::new(&config);
        Self {
            ctx: BridgeContext::new(config, notifier),
            connector,
        }
    }

    /// The editor state.
    pub fn context(&self) -> &BridgeContext {
        &self.ctx
    }

    /// The language service connector.
    pub fn connector(&self) -> &LanguageServiceConnector {
        &self.connector
    }

    fn synced<T>(&mut self, result: T) -> T {
        self.connector.sync_documents(&self.ctx);
        result
    }

    /// Show an existing model in the normal editor.
    pub fn set_model(&mut self, uri_b64: &str) -> Result<(), FfiError> {
        let uri = decode_uri(uri_b64)?;
        self.ctx.set_model(&uri);
        Ok(self.synced(()))
    }

    /// Create or update a model and show it.
    pub fn create_or_update_model(&mut self, uri_b64: &str, content_b64: &str) -> Result<(), FfiError> {
        let uri = decode_uri(uri_b64)?;
        let content = decode_base64(content_b64)?;
        self.ctx.create_or_update_model(&uri, &content);
        Ok(self.synced(()))
    }

    /// Move a model to a new URI.
    pub fn rename_model(&mut self, old_b64: &str, new_b64: &str) -> Result<(), FfiError> {
        let old = decode_uri(old_b64)?;
        let new = decode_uri(new_b64)?;
        let result = self.ctx.rename_model(&old, &new);
        Ok(self.synced(result)?)
    }

    /// Replace a model's text.
    pub fn set_content(&mut self, uri_b64: &str, content_b64: &str) -> Result<(), FfiError> {
        let uri = decode_uri(uri_b64)?;
        let content = decode_base64(content_b64)?;
        let result = self.ctx.set_model_content(&uri, &content);
        Ok(self.synced(result)?)
    }

    /// Switch to (or update) the diff view.
    pub fn enter_diff_view(
        &mut self,
        original_text_b64: &str,
        modified_text_b64: &str,
        original_uri_b64: &str,
        modified_uri_b64: &str,
    ) -> Result<(), FfiError> {
        let original_text = decode_base64(original_text_b64)?;
        let modified_text = decode_base64(modified_text_b64)?;
        let original_uri = decode_uri(original_uri_b64)?;
        let modified_uri = decode_uri(modified_uri_b64)?;
        self.ctx
            .enter_diff_view(&original_text, &modified_text, &original_uri, &modified_uri);
        Ok(self.synced(()))
    }

    /// Return to the normal editor.
    pub fn exit_diff_view(&mut self) {
        self.ctx.exit_diff_view();
        self.synced(())
    }

    /// Connect to a language service, replacing any existing connection.
    pub fn connect_language_service(
        &mut self,
        url: &str,
        launch_args: Vec<String>,
        working_directory_bookmark: &str,
        language: &str,
        workspace_root: Option<String>,
    ) -> ConnectionId {
        self.connector.connect(ConnectRequest {
            url: url.to_string(),
            launch_args,
            working_directory_bookmark: working_directory_bookmark.to_string(),
            language: language.to_string(),
            workspace_root,
        })
    }

    /// Close the language service connection, if any.
    pub fn disconnect_language_service(&mut self) {
        self.connector.disconnect();
    }

    /// Whether a language service socket is open.
    pub fn is_language_service_connected(&self) -> bool {
        self.connector.is_connected()
    }

    /// Current language service connection state.
    pub fn language_service_state(&self) -> ConnectionState {
        self.connector.state()
    }

    /// Drop the dirty-diff decorations of the normal editor.
    pub fn invalidate_diff_decorations(&mut self) {
        self.ctx.invalidate_decorations();
    }

    /// Set the baseline for `uri`. The URI is plain text; the content is base64.
    pub fn provide_baseline(&mut self, uri: &str, content_b64: &str) -> Result<(), FfiError> {
        let content = decode_base64(content_b64)?;
        self.ctx.provide_baseline(&ModelUri::parse(uri), &content);
        Ok(self.synced(()))
    }

    /// Store a base64 JSON theme and re-apply.
    pub fn apply_theme(&mut self, theme_b64: &str) -> Result<(), FfiError> {
        let theme = Theme::from_json_str(&decode_base64(theme_b64)?)?;
        self.ctx.apply_theme(theme);
        Ok(())
    }

    /// Record the host colour scheme (`dark` or `light`).
    pub fn set_color_scheme(&mut self, scheme: &str) -> Result<(), FfiError> {
        self.ctx.set_color_scheme(ColorScheme::parse(scheme)?);
        Ok(())
    }

    /// Enable or disable modal editing.
    pub fn toggle_modal_editing(&mut self, enabled: bool) {
        self.ctx.toggle_modal_editing(enabled);
    }

    /// Dispose a model.
    pub fn dispose_model(&mut self, uri_b64: &str) -> Result<(), FfiError> {
        let uri = decode_uri(uri_b64)?;
        self.ctx.dispose_model(&uri);
        Ok(self.synced(()))
    }

    /// Apply an edit batch as one undo step.
    pub fn apply_edits(&mut self, uri_b64: &str, edits: &[SingleEdit]) -> Result<(), FfiError> {
        let uri = decode_uri(uri_b64)?;
        let result = self.ctx.apply_edits(&uri, edits);
        Ok(self.synced(result)?)
    }

    /// Undo on a model. Returns whether anything changed.
    pub fn undo(&mut self, uri_b64: &str) -> Result<bool, FfiError> {
        let uri = decode_uri(uri_b64)?;
        let changed = self.ctx.undo(&uri);
        Ok(self.synced(changed))
    }

    /// Redo on a model. Returns whether anything changed.
    pub fn redo(&mut self, uri_b64: &str) -> Result<bool, FfiError> {
        let uri = decode_uri(uri_b64)?;
        let changed = self.ctx.redo(&uri);
        Ok(self.synced(changed))
    }

    /// Move the cursor of the focused editor.
    pub fn set_cursor(&mut self, line_number: usize, column: usize) {
        self.ctx.set_cursor(Position::new(line_number, column));
    }

    /// Scroll the focused editor.
    pub fn set_scroll_position(&mut self, top: u32, left: u32) {
        self.ctx.set_scroll_position(top, left);
    }

    /// Record folded regions of the focused editor (1-based start lines).
    pub fn set_folded_lines(&mut self, lines: Vec<usize>) {
        self.ctx.set_folded_lines(lines);
    }

    /// Replace the host-owned markers of a model.
    pub fn set_markers(&mut self, uri_b64: &str, markers: Vec<MarkerData>) -> Result<(), FfiError> {
        let uri = decode_uri(uri_b64)?;
        let owner = self.ctx.config().marker_owner.clone();
        self.ctx.set_model_markers(&owner, &uri, markers);
        Ok(())
    }

    /// Jump to the next change in the diff view.
    pub fn go_to_next_diff(&mut self) -> bool {
        self.ctx.go_to_next_diff()
    }

    /// Jump to the previous change in the diff view.
    pub fn go_to_previous_diff(&mut self) -> bool {
        self.ctx.go_to_previous_diff()
    }

    /// The host's text input gained focus.
    pub fn input_focused(&self) {
        self.ctx.input_focused();
    }

    /// A link inside the editor was activated.
    pub fn open_link(&self, url: &str) {
        self.ctx.open_link(url);
    }

    /// Drive the language service connection. Hosts call this periodically.
    pub fn poll(&mut self) {
        self.connector.poll(&mut self.ctx);
    }
}
