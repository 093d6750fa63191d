//! JSON call documents.
//!
//! Hosts that cannot link against the Rust API (the C ABI, the stdio host) send one JSON
//! object per boundary call, tagged by `call`:
//!
//! ```json
//! { "call": "createOrUpdateModel", "uri": "ZmlsZTovLy9hLnR4dA==", "content": "aGk=" }
//! ```
//!
//! Field names and encodings match the [`Bridge`] methods.

use crate::bridge::Bridge;
use crate::error::FfiError;
use editor_bridge::{MarkerData, SingleEdit};
use serde::Deserialize;
use serde_json::Value;

/// One boundary call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[allow(missing_docs)]
pub enum Call {
    SetModel {
        uri: String,
    },
    CreateOrUpdateModel {
        uri: String,
        content: String,
    },
    RenameModel {
        old_uri: String,
        new_uri: String,
    },
    SetContent {
        uri: String,
        content: String,
    },
    EnterDiffView {
        original_text: String,
        modified_text: String,
        original_uri: String,
        modified_uri: String,
    },
    ExitDiffView,
    ConnectLanguageService {
        url: String,
        #[serde(default)]
        launch_args: Vec<String>,
        #[serde(default)]
        working_directory_bookmark: String,
        language: String,
        #[serde(default)]
        workspace_root: Option<String>,
    },
    DisconnectLanguageService,
    IsLanguageServiceConnected,
    InvalidateDiffDecorations,
    ProvideBaseline {
        uri: String,
        content: String,
    },
    ApplyTheme {
        theme: String,
    },
    SetColorScheme {
        scheme: String,
    },
    ToggleModalEditing {
        enabled: bool,
    },
    DisposeModel {
        uri: String,
    },
    ApplyEdits {
        uri: String,
        edits: Vec<SingleEdit>,
    },
    Undo {
        uri: String,
    },
    Redo {
        uri: String,
    },
    SetCursor {
        line_number: usize,
        column: usize,
    },
    SetScrollPosition {
        top: u32,
        left: u32,
    },
    SetFoldedLines {
        lines: Vec<usize>,
    },
    SetMarkers {
        uri: String,
        markers: Vec<MarkerData>,
    },
    GoToNextDiff,
    GoToPreviousDiff,
    InputFocused,
    OpenLink {
        url: String,
    },
    Poll,
}

impl Call {
    /// Parse a call document.
    pub fn from_json_str(json: &str) -> Result<Self, FfiError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Bridge {
    /// Run one call. Calls without a result return `null`.
    pub fn dispatch(&mut self, call: Call) -> Result<Value, FfiError> {
        tracing::trace!(?call, "boundary call");
        let result = match call {
            Call::SetModel { uri } => self.set_model(&uri)?.into(),
            Call::CreateOrUpdateModel { uri, content } => {
                self.create_or_update_model(&uri, &content)?.into()
            }
            Call::RenameModel { old_uri, new_uri } => self.rename_model(&old_uri, &new_uri)?.into(),
            Call::SetContent { uri, content } => self.set_content(&uri, &content)?.into(),
            Call::EnterDiffView {
                original_text,
                modified_text,
                original_uri,
                modified_uri,
            } => self
                .enter_diff_view(&original_text, &modified_text, &original_uri, &modified_uri)?
                .into(),
            Call::ExitDiffView => self.exit_diff_view().into(),
            Call::ConnectLanguageService {
                url,
                launch_args,
                working_directory_bookmark,
                language,
                workspace_root,
            } => {
                let id = self.connect_language_service(
                    &url,
                    launch_args,
                    &working_directory_bookmark,
                    &language,
                    workspace_root,
                );
                Value::from(id.0)
            }
            Call::DisconnectLanguageService => self.disconnect_language_service().into(),
            Call::IsLanguageServiceConnected => Value::Bool(self.is_language_service_connected()),
            Call::InvalidateDiffDecorations => self.invalidate_diff_decorations().into(),
            Call::ProvideBaseline { uri, content } => self.provide_baseline(&uri, &content)?.into(),
            Call::ApplyTheme { theme } => self.apply_theme(&theme)?.into(),
            Call::SetColorScheme { scheme } => self.set_color_scheme(&scheme)?.into(),
            Call::ToggleModalEditing { enabled } => self.toggle_modal_editing(enabled).into(),
            Call::DisposeModel { uri } => self.dispose_model(&uri)?.into(),
            Call::ApplyEdits { uri, edits } => self.apply_edits(&uri, &edits)?.into(),
            Call::Undo { uri } => Value::Bool(self.undo(&uri)?),
            Call::Redo { uri } => Value::Bool(self.redo(&uri)?),
            Call::SetCursor {
                line_number,
                column,
            } => self.set_cursor(line_number, column).into(),
            Call::SetScrollPosition { top, left } => self.set_scroll_position(top, left).into(),
            Call::SetFoldedLines { lines } => self.set_folded_lines(lines).into(),
            Call::SetMarkers { uri, markers } => self.set_markers(&uri, markers)?.into(),
            Call::GoToNextDiff => Value::Bool(self.go_to_next_diff()),
            Call::GoToPreviousDiff => Value::Bool(self.go_to_previous_diff()),
            Call::InputFocused => self.input_focused().into(),
            Call::OpenLink { url } => self.open_link(&url).into(),
            Call::Poll => self.poll().into(),
        };
        Ok(result)
    }

    /// Parse and run one call document.
    pub fn dispatch_json(&mut self, json: &str) -> Result<Value, FfiError> {
        let call = Call::from_json_str(json)?;
        self.dispatch(call)
    }
}
