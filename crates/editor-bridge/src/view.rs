//! View coordinator: normal editor vs side-by-side diff.
//!
//! Exactly one view is mounted at a time. Switching tears the old surfaces down completely
//! (listeners, decorations, soft keyboard, modal session) before the new ones are built.

use crate::context::BridgeContext;
use crate::diff::{DiffOptions, compute_dirty_diff};
use crate::host::HostEvent;
use crate::model::Position;
use crate::router::BusEvent;
use crate::surface::{Surface, SurfaceId, SurfaceRole};
use crate::uri::ModelUri;

/// The mounted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Nothing mounted (only observable mid-transition).
    Unmounted,
    /// A single editor.
    Normal {
        /// The editor surface.
        editor: SurfaceId,
    },
    /// Two editors showing an original/modified pair.
    Diff {
        /// Left side.
        original: SurfaceId,
        /// Right side.
        modified: SurfaceId,
    },
}

/// Direction for diff navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffDirection {
    /// Towards the end of the document.
    Next,
    /// Towards the start of the document.
    Previous,
}

impl BridgeContext {
    /// Switch to (or update) the diff view.
    ///
    /// Models already registered at either URI are disposed and re-created with the given text.
    /// When the diff view is already mounted its surfaces are reused.
    pub fn enter_diff_view(
        &mut self,
        original_text: &str,
        modified_text: &str,
        original_uri: &ModelUri,
        modified_uri: &ModelUri,
    ) {
        let (original, modified) = match self.view {
            ViewMode::Diff { original, modified } => (original, modified),
            _ => {
                self.teardown_all();
                let original = self.create_surface(SurfaceRole::DiffOriginal);
                let modified = self.create_surface(SurfaceRole::DiffModified);
                self.view = ViewMode::Diff { original, modified };
                self.attach_listeners(original);
                self.attach_listeners(modified);
                tracing::debug!("diff view mounted");
                (original, modified)
            }
        };

        self.dispose_model(original_uri);
        self.dispose_model(modified_uri);
        self.registry
            .get_or_create(original_uri, Some(original_text), None);
        self.registry
            .get_or_create(modified_uri, Some(modified_text), None);

        self.bind_model(original, Some(original_uri.clone()));
        self.bind_model(modified, Some(modified_uri.clone()));
        self.pump();
    }

    /// Tear down whatever is mounted and mount a fresh normal editor.
    pub fn exit_diff_view(&mut self) {
        self.teardown_all();
        self.mount_normal();
        if let Some(uri) = self.active_model().cloned() {
            self.dispose_model(&uri);
        }
        tracing::debug!("normal view mounted");
    }

    /// Move the cursor of the modified side to the next changed region (wrapping).
    pub fn go_to_next_diff(&mut self) -> bool {
        self.go_to_diff(DiffDirection::Next)
    }

    /// Move the cursor of the modified side to the previous changed region (wrapping).
    pub fn go_to_previous_diff(&mut self) -> bool {
        self.go_to_diff(DiffDirection::Previous)
    }

    fn go_to_diff(&mut self, direction: DiffDirection) -> bool {
        let ViewMode::Diff { original, modified } = self.view else {
            return false;
        };
        let (Some(original_uri), Some(modified_uri)) = (
            self.surfaces.get(&original).and_then(Surface::model),
            self.surfaces.get(&modified).and_then(Surface::model),
        ) else {
            return false;
        };
        let options = DiffOptions {
            ignore_trim_whitespace: self.config.ignore_trim_whitespace,
            time_budget: self.config.diff_time_budget(),
        };
        let Some(result) = compute_dirty_diff(&self.registry, original_uri, modified_uri, &options)
        else {
            return false;
        };
        let starts: Vec<usize> = result
            .changes
            .iter()
            .map(|change| change.modified_start_line_number.max(1))
            .collect();
        let (Some(&first), Some(&last)) = (starts.first(), starts.last()) else {
            return false;
        };

        let current = self
            .surfaces
            .get(&modified)
            .map(|surface| surface.position().line_number)
            .unwrap_or(1);
        let target = match direction {
            DiffDirection::Next => starts
                .iter()
                .copied()
                .find(|&line| line > current)
                .unwrap_or(first),
            DiffDirection::Previous => starts
                .iter()
                .rev()
                .copied()
                .find(|&line| line < current)
                .unwrap_or(last),
        };

        let Some(position) = self
            .registry
            .get(modified_uri)
            .map(|model| model.validate_position(Position::new(target, 1)))
        else {
            return false;
        };
        if let Some(surface) = self.surfaces.get_mut(&modified)
            && surface.set_position(position)
        {
            self.publish(BusEvent::CursorMoved(modified));
            self.pump();
        }
        true
    }

    pub(crate) fn create_surface(&mut self, role: SurfaceRole) -> SurfaceId {
        self.next_surface_id += 1;
        let id = SurfaceId(self.next_surface_id);
        let mut surface = Surface::new(id, role);
        if self.config.disable_soft_keyboard {
            surface.release_soft_keyboard();
        }
        self.surfaces.insert(id, surface);
        id
    }

    pub(crate) fn mount_normal(&mut self) {
        let editor = self.create_surface(SurfaceRole::Standalone);
        self.view = ViewMode::Normal { editor };
        self.attach_listeners(editor);
        for event in self.modal.attach(editor) {
            self.notify(event);
        }
    }

    pub(crate) fn attach_listeners(&mut self, id: SurfaceId) {
        if !self.listeners.insert(id) {
            return;
        }
        self.apply_current_theme();
        self.notify(HostEvent::EditorInitialising);
    }

    fn teardown_all(&mut self) {
        match self.view {
            ViewMode::Normal { editor } => self.teardown(editor),
            ViewMode::Diff { original, modified } => {
                self.teardown(modified);
                self.teardown(original);
            }
            ViewMode::Unmounted => {}
        }
        self.view = ViewMode::Unmounted;
    }

    fn teardown(&mut self, id: SurfaceId) {
        if self.modal.release(id) {
            tracing::debug!(surface = id.0, "modal session released with its surface");
        }
        self.listeners.remove(&id);
        if let Some(mut surface) = self.surfaces.remove(&id) {
            if surface.role() == SurfaceRole::Standalone {
                self.renderer.reset();
            }
            surface.dispose();
        }
    }
}
