#![warn(missing_docs)]
//! Editor Bridge - headless model/view orchestration for an embedded code editor
//!
//! # Overview
//!
//! `editor-bridge` sits between a host application and an embedded editing component. The host
//! talks to it through a narrow, serializable boundary (base64 strings in, JSON notifications
//! out); the bridge owns everything in between: URI-keyed text models, editor surfaces, the
//! normal/diff view switch, dirty-diff decorations against a baseline, markers, themes and the
//! modal-editing status line.
//!
//! Nothing here renders. Surfaces carry cursor, scroll and decoration state as plain data and
//! the host draws from that state plus the notifications it receives through [`HostNotifier`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  BridgeContext (host-facing operations)     │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Change-event router (queued, FIFO)         │  ← Notifications
//! ├─────────────────────────────────────────────┤
//! │  View coordinator (normal / diff surfaces)  │  ← Surfaces
//! ├─────────────────────────────────────────────┤
//! │  Diff engine + decoration renderer          │  ← Dirty diff
//! ├─────────────────────────────────────────────┤
//! │  Model registry (rope text, undo history)   │  ← Buffers
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_bridge::{BridgeConfig, BridgeContext, HostEvent, HostEventLog, ModelUri};
//! use std::rc::Rc;
//!
//! let log = Rc::new(HostEventLog::new());
//! let mut ctx = BridgeContext::new(BridgeConfig::default(), log.clone());
//!
//! let uri = ModelUri::parse("file:///notes.txt");
//! ctx.create_or_update_model(&uri, "a\nb\n");
//! ctx.provide_baseline(&uri, "a\n");
//!
//! // One added line against the baseline.
//! assert_eq!(ctx.decorations().unwrap().len(), 1);
//! assert!(log
//!     .events()
//!     .contains(&HostEvent::DiffUpdateRequested { uri: uri.to_string() }));
//! ```
//!
//! # Module Description
//!
//! - [`uri`] - canonical model URIs
//! - [`model`] / [`history`] - text models and their undo history
//! - [`registry`] - URI-keyed model ownership
//! - [`diff`] / [`decorations`] - dirty diff and its gutter decorations
//! - [`surface`] / [`view`] - headless editor widgets and the view switch
//! - [`markers`], [`theme`], [`modal`] - host-visible auxiliary state
//! - [`host`] - notifications sent to the host

pub mod config;
pub mod context;
pub mod decorations;
pub mod diff;
pub mod encoding;
pub mod error;
pub mod history;
pub mod host;
pub mod markers;
pub mod modal;
pub mod model;
pub mod registry;
mod router;
pub mod surface;
pub mod theme;
pub mod uri;
pub mod view;

pub use config::BridgeConfig;
pub use context::BridgeContext;
pub use decorations::{
    DecorationHandle, DecorationOptions, DecorationRenderer, DecorationSet, MAX_COLUMN,
    ModelDecoration,
};
pub use diff::{ChangeKind, DiffOptions, DiffResult, LineChange, compute_dirty_diff, compute_line_diff};
pub use encoding::{decode_base64, encode_base64};
pub use error::BridgeError;
pub use history::EditHistory;
pub use host::{HostEvent, HostEventLog, HostNotifier};
pub use markers::{Marker, MarkerData, MarkerSeverity, MarkerStore};
pub use modal::ModalEditing;
pub use model::{ContentChange, ContentChangeEvent, Position, SingleEdit, TextModel, TextRange};
pub use registry::{ModelRegistry, ModelUpsert};
pub use surface::{Surface, SurfaceId, SurfaceRole, ViewState};
pub use theme::{ColorScheme, Theme, ThemeStore};
pub use uri::ModelUri;
pub use view::ViewMode;

pub use editor_bridge_lang::{LanguageConfig, LanguageRegistry, PLAINTEXT};
