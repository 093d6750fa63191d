//! Headless editor surfaces.
//!
//! A surface is what the host would render as an editor widget: it shows at most one model and
//! carries the per-widget state (cursor, scroll, folds, decorations). Surfaces never own models;
//! they refer to them by URI.

use crate::decorations::DecorationSet;
use crate::model::Position;
use crate::uri::ModelUri;
use serde::{Deserialize, Serialize};

/// Surface identifier, unique within one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SurfaceId(pub u64);

/// What a surface is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SurfaceRole {
    /// The single editor of normal mode.
    Standalone,
    /// Left side of the diff view.
    DiffOriginal,
    /// Right side of the diff view.
    DiffModified,
}

/// Saved per-model view state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Cursor position.
    pub cursor: Position,
    /// Vertical scroll offset.
    pub scroll_top: u32,
    /// Horizontal scroll offset.
    pub scroll_left: u32,
    /// Start lines of folded regions.
    pub folded_lines: Vec<usize>,
}

/// Result of binding a different model to a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSwitch {
    /// Previously bound model.
    pub old: Option<ModelUri>,
    /// Newly bound model.
    pub new: Option<ModelUri>,
}

/// A headless editor widget.
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    role: SurfaceRole,
    model: Option<ModelUri>,
    position: Position,
    scroll_top: u32,
    scroll_left: u32,
    folded_lines: Vec<usize>,
    decorations: DecorationSet,
    soft_keyboard: bool,
    focus_armed: bool,
    disposed: bool,
}

impl Surface {
    /// Create an empty surface. It starts with a soft-keyboard helper attached.
    pub fn new(id: SurfaceId, role: SurfaceRole) -> Self {
        Self {
            id,
            role,
            model: None,
            position: Position::default(),
            scroll_top: 0,
            scroll_left: 0,
            folded_lines: Vec::new(),
            decorations: DecorationSet::new(),
            soft_keyboard: true,
            focus_armed: false,
            disposed: false,
        }
    }

    /// Surface id.
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Surface role.
    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    /// Bound model.
    pub fn model(&self) -> Option<&ModelUri> {
        self.model.as_ref()
    }

    /// Cursor position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Scroll offsets `(top, left)`.
    pub fn scroll(&self) -> (u32, u32) {
        (self.scroll_top, self.scroll_left)
    }

    /// Live decorations.
    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    /// Live decorations, mutably.
    pub fn decorations_mut(&mut self) -> &mut DecorationSet {
        &mut self.decorations
    }

    /// Whether the soft-keyboard helper is still attached.
    pub fn has_soft_keyboard(&self) -> bool {
        self.soft_keyboard
    }

    /// Whether the next input focus is reported to the host.
    pub fn focus_armed(&self) -> bool {
        self.focus_armed
    }

    /// Whether the surface has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Bind `model`. Returns the switch when the binding actually changed.
    ///
    /// Per-widget view state is reset; callers restore a saved state afterwards.
    pub fn set_model(&mut self, model: Option<ModelUri>) -> Option<ModelSwitch> {
        if self.model == model {
            return None;
        }
        let old = std::mem::replace(&mut self.model, model.clone());
        self.position = Position::default();
        self.scroll_top = 0;
        self.scroll_left = 0;
        self.folded_lines.clear();
        Some(ModelSwitch { old, new: model })
    }

    /// Snapshot the view state.
    pub fn save_view_state(&self) -> ViewState {
        ViewState {
            cursor: self.position,
            scroll_top: self.scroll_top,
            scroll_left: self.scroll_left,
            folded_lines: self.folded_lines.clone(),
        }
    }

    /// Apply a saved view state. The cursor is expected to be validated by the caller.
    pub fn restore_view_state(&mut self, state: &ViewState) {
        self.position = state.cursor;
        self.scroll_top = state.scroll_top;
        self.scroll_left = state.scroll_left;
        self.folded_lines = state.folded_lines.clone();
    }

    /// Move the cursor. Returns whether it moved.
    pub fn set_position(&mut self, position: Position) -> bool {
        if self.position == position {
            return false;
        }
        self.position = position;
        true
    }

    /// Set scroll offsets.
    pub fn set_scroll(&mut self, top: u32, left: u32) {
        self.scroll_top = top;
        self.scroll_left = left;
    }

    /// Set folded region starts.
    pub fn set_folded_lines(&mut self, mut lines: Vec<usize>) {
        lines.sort_unstable();
        lines.dedup();
        self.folded_lines = lines;
    }

    /// Start lines of folded regions, ascending.
    pub fn folded_lines(&self) -> &[usize] {
        &self.folded_lines
    }

    /// Arm or disarm the focus listener.
    pub fn set_focus_armed(&mut self, armed: bool) {
        self.focus_armed = armed;
    }

    /// Release the soft-keyboard helper. Returns whether one was attached.
    pub fn release_soft_keyboard(&mut self) -> bool {
        std::mem::replace(&mut self.soft_keyboard, false)
    }

    /// Dispose the surface: helpers released, decorations dropped, model unbound.
    pub fn dispose(&mut self) {
        self.release_soft_keyboard();
        self.decorations.clear();
        self.model = None;
        self.focus_armed = false;
        self.disposed = true;
    }
}
