//! Notifications sent to the embedding host.
//!
//! Events serialize as flat JSON objects tagged by `Event`. The tag values and field names
//! are a fixed wire contract with existing hosts, typos included.

use crate::markers::Marker;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;

/// A host notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Event")]
pub enum HostEvent {
    /// Listeners were attached to a freshly mounted surface.
    #[serde(rename = "Editor Initialising")]
    EditorInitialising,

    /// The host should send a baseline for `uri`.
    #[serde(rename = "Request Diff Update")]
    DiffUpdateRequested {
        /// Model URI.
        #[serde(rename = "URI")]
        uri: String,
    },

    /// The cursor moved.
    #[serde(rename = "Crusor Position changed")]
    CursorPositionChanged {
        /// 1-based column.
        #[serde(rename = "Column")]
        column: usize,
        /// 1-based line.
        #[serde(rename = "lineNumber")]
        line_number: usize,
    },

    /// Model text changed through an edit.
    #[serde(rename = "Content changed")]
    ContentChanged {
        /// Model version after the change.
        #[serde(rename = "VersionID")]
        version_id: u64,
        /// Model URI.
        #[serde(rename = "URI")]
        uri: String,
        /// Full model text.
        #[serde(rename = "currentContent")]
        current_content: String,
        /// Char offset where the changed span starts.
        #[serde(rename = "startOffset")]
        start_offset: usize,
        /// Char offset where the changed span ends.
        #[serde(rename = "endOffset")]
        end_offset: usize,
    },

    /// The marker set changed.
    #[serde(rename = "Markers updated")]
    MarkersUpdated {
        /// Every marker currently stored.
        #[serde(rename = "Markers")]
        markers: Vec<Marker>,
    },

    /// The language service socket closed.
    #[serde(rename = "Language Server Connection Dropped")]
    LanguageServiceDropped {
        /// Language the connection served.
        #[serde(rename = "languageIdentifier")]
        language_identifier: String,
    },

    /// Modal editing switched mode.
    #[serde(rename = "vim.mode.change")]
    ModalModeChanged {
        /// Display label, e.g. `--INSERT--`.
        #[serde(rename = "newMode")]
        new_mode: String,
    },

    /// Pending modal key sequence.
    #[serde(rename = "vim.keybuffer.set")]
    ModalKeyBufferSet {
        /// Keys typed so far.
        buffer: String,
    },

    /// Modal command line visibility.
    #[serde(rename = "vim.visible.set")]
    ModalVisibilitySet {
        /// Whether the command line is shown.
        #[serde(rename = "isVisible")]
        is_visible: bool,
    },

    /// Modal command input closed.
    #[serde(rename = "vim.close.input")]
    ModalCloseInput,

    /// Modal status cleared.
    #[serde(rename = "vim.clear")]
    ModalClear,

    /// A link was activated.
    #[serde(rename = "Open URL")]
    OpenExternalUrl {
        /// Target URL.
        url: String,
    },

    /// Text input gained focus.
    #[serde(rename = "focus")]
    Focus,

    /// A theme was applied.
    #[serde(rename = "Theme Applied")]
    ThemeApplied {
        /// Base theme (`vs` or `vs-dark`).
        base: String,
        /// User configuration carrying the colour customizations.
        configuration: Value,
    },
}

impl HostEvent {
    /// JSON form of the event.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Sink for host notifications.
///
/// The core calls this synchronously from the thread that drives it.
pub trait HostNotifier {
    /// Deliver one notification.
    fn notify(&self, event: HostEvent);
}

impl<F> HostNotifier for F
where
    F: Fn(HostEvent),
{
    fn notify(&self, event: HostEvent) {
        self(event)
    }
}

/// A notifier that records events in memory.
#[derive(Debug, Default)]
pub struct HostEventLog {
    events: RefCell<Vec<HostEvent>>,
}

impl HostEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return the recorded events.
    pub fn take(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl HostNotifier for HostEventLog {
    fn notify(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}
