//! The bridge context: one embedded editor instance.
//!
//! [`BridgeContext`] owns every component (models, markers, surfaces, the decoration renderer,
//! themes, modal state) and is the only entry point hosts call into. Several contexts can live
//! side by side; nothing is global.
//!
//! Requests that name a missing model are silent no-ops. Errors are reserved for malformed
//! input and identity conflicts (see [`BridgeError`]).

use crate::config::BridgeConfig;
use crate::decorations::{DecorationHandle, DecorationRenderer, DecorationSet};
use crate::diff::{DiffOptions, compute_dirty_diff};
use crate::error::BridgeError;
use crate::host::{HostEvent, HostNotifier};
use crate::markers::{MarkerData, MarkerStore};
use crate::modal::ModalEditing;
use crate::model::{ContentChangeEvent, Position, SingleEdit};
use crate::registry::ModelRegistry;
use crate::router::BusEvent;
use crate::surface::{Surface, SurfaceId, ViewState};
use crate::theme::{ColorScheme, Theme, ThemeStore};
use crate::uri::ModelUri;
use crate::view::ViewMode;
use editor_bridge_lang::{LanguageRegistry, PLAINTEXT};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

/// One embedded editor instance.
///
/// # Example
///
/// ```rust
/// use editor_bridge::{BridgeConfig, BridgeContext, HostEventLog, ModelUri};
/// use std::rc::Rc;
///
/// let log = Rc::new(HostEventLog::new());
/// let mut ctx = BridgeContext::new(BridgeConfig::default(), log.clone());
///
/// let uri = ModelUri::parse("file:///src/main.rs");
/// ctx.create_or_update_model(&uri, "fn main() {}\n");
/// assert_eq!(ctx.active_model(), Some(&uri));
/// ```
pub struct BridgeContext {
    pub(crate) config: BridgeConfig,
    pub(crate) notifier: Rc<dyn HostNotifier>,
    pub(crate) registry: ModelRegistry,
    pub(crate) markers: MarkerStore,
    pub(crate) surfaces: BTreeMap<SurfaceId, Surface>,
    pub(crate) next_surface_id: u64,
    pub(crate) view: ViewMode,
    pub(crate) listeners: BTreeSet<SurfaceId>,
    pub(crate) view_states: HashMap<ModelUri, ViewState>,
    pub(crate) renderer: DecorationRenderer,
    pub(crate) themes: ThemeStore,
    pub(crate) modal: ModalEditing,
    pub(crate) bus: VecDeque<BusEvent>,
    pub(crate) diff_runs: u64,
}

impl BridgeContext {
    /// Create a context with the built-in language table and mount the normal view.
    pub fn new(config: BridgeConfig, notifier: Rc<dyn HostNotifier>) -> Self {
        Self::with_languages(config, LanguageRegistry::builtin(), notifier)
    }

    /// Create a context with a custom language table.
    pub fn with_languages(
        config: BridgeConfig,
        languages: LanguageRegistry,
        notifier: Rc<dyn HostNotifier>,
    ) -> Self {
        let registry = ModelRegistry::new(languages, config.max_undo_steps);
        let mut ctx = Self {
            config,
            notifier,
            registry,
            markers: MarkerStore::new(),
            surfaces: BTreeMap::new(),
            next_surface_id: 0,
            view: ViewMode::Unmounted,
            listeners: BTreeSet::new(),
            view_states: HashMap::new(),
            renderer: DecorationRenderer::new(),
            themes: ThemeStore::new(),
            modal: ModalEditing::new(),
            bus: VecDeque::new(),
            diff_runs: 0,
        };
        ctx.mount_normal();
        ctx
    }

    /// Configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Live models.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Stored markers.
    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    /// Current view mode.
    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Look up a mounted surface.
    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    /// The normal-mode editor surface, if mounted.
    pub fn normal_surface(&self) -> Option<&Surface> {
        match self.view {
            ViewMode::Normal { editor } => self.surfaces.get(&editor),
            _ => None,
        }
    }

    /// Model bound to the normal-mode editor.
    pub fn active_model(&self) -> Option<&ModelUri> {
        self.normal_surface().and_then(Surface::model)
    }

    /// Decorations of the normal-mode editor.
    pub fn decorations(&self) -> Option<&DecorationSet> {
        self.normal_surface().map(Surface::decorations)
    }

    /// Number of surfaces with listeners attached.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of dirty diffs computed so far.
    pub fn diff_computations(&self) -> u64 {
        self.diff_runs
    }

    /// Saved view state for `uri`.
    pub fn view_state(&self, uri: &ModelUri) -> Option<&ViewState> {
        self.view_states.get(uri)
    }

    /// Handles of the dirty-diff decorations currently rendered on the normal editor.
    pub fn decoration_handles(&self) -> &[DecorationHandle] {
        self.renderer.previous()
    }

    /// Modal editing state.
    pub fn modal(&self) -> &ModalEditing {
        &self.modal
    }

    pub(crate) fn notify(&self, event: HostEvent) {
        self.notifier.notify(event);
    }

    /// Surface user input goes to: the normal editor, or the modified side of the diff view.
    pub(crate) fn focused_surface_id(&self) -> Option<SurfaceId> {
        match self.view {
            ViewMode::Normal { editor } => Some(editor),
            ViewMode::Diff { modified, .. } => Some(modified),
            ViewMode::Unmounted => None,
        }
    }

    /// Show `uri` in the normal editor. Missing models and diff mode are no-ops.
    pub fn set_model(&mut self, uri: &ModelUri) {
        let ViewMode::Normal { editor } = self.view else {
            tracing::debug!(uri = %uri, "set_model ignored outside normal view");
            return;
        };
        if !self.registry.contains(uri) {
            tracing::debug!(uri = %uri, "set_model ignored for missing model");
            return;
        }
        self.bind_model(editor, Some(uri.clone()));
        self.pump();
    }

    /// Create `uri` (or replace its content when it differs) and show it in the normal editor.
    ///
    /// A no-op in diff mode.
    pub fn create_or_update_model(&mut self, uri: &ModelUri, content: &str) {
        let ViewMode::Normal { editor } = self.view else {
            tracing::debug!(uri = %uri, "create_or_update_model ignored outside normal view");
            return;
        };
        let upsert = self.registry.get_or_create(uri, Some(content), None);
        if let Some(change) = upsert.change {
            self.emit_content_change(change);
        }
        self.bind_model(editor, Some(uri.clone()));
        self.pump();
    }

    /// Move a model to a new URI, keeping its text and undo history.
    ///
    /// A missing `old` is a no-op. Surfaces showing `old` switch to `new` with their view state.
    /// The baseline of `old` is not carried over.
    pub fn rename_model(&mut self, old: &ModelUri, new: &ModelUri) -> Result<(), BridgeError> {
        if !self.registry.contains(old) {
            tracing::debug!(old = %old, "rename ignored for missing model");
            return Ok(());
        }
        if old == new {
            return Ok(());
        }
        if self.registry.contains(new) {
            return Err(BridgeError::ModelAlreadyExists(new.to_string()));
        }

        let bound: Vec<SurfaceId> = self.surfaces_showing(old);
        self.publish(BusEvent::WillDisposeModel(old.clone()));
        self.pump();
        self.registry.rename(old, new)?;

        for id in bound {
            if let Some(surface) = self.surfaces.get(&id) {
                self.view_states
                    .insert(new.clone(), surface.save_view_state());
            }
            self.bind_model(id, Some(new.clone()));
        }
        self.pump();
        self.view_states.remove(old);
        Ok(())
    }

    /// Replace the text of `uri`.
    ///
    /// When `uri` is shown in the normal editor this is one undoable full-range edit and hosts
    /// get a content notification; otherwise the text is flushed. A no-op in diff mode or for a
    /// missing model.
    pub fn set_model_content(&mut self, uri: &ModelUri, content: &str) -> Result<(), BridgeError> {
        if !matches!(self.view, ViewMode::Normal { .. }) {
            tracing::debug!(uri = %uri, "set_model_content ignored outside normal view");
            return Ok(());
        }
        let Some(model) = self.registry.get(uri) else {
            tracing::debug!(uri = %uri, "set_model_content ignored for missing model");
            return Ok(());
        };

        let event = if self.active_model() == Some(uri) {
            let edit = SingleEdit::new(model.full_range(), content);
            self.registry.apply_edits(uri, &[edit])?
        } else {
            self.registry.set_value(uri, content)
        };
        if let Some(event) = event {
            self.emit_content_change(event);
        }
        Ok(())
    }

    /// Dispose `uri`. Bridge-owned markers for it are cleared first. Missing models are a no-op.
    pub fn dispose_model(&mut self, uri: &ModelUri) {
        if !self.registry.contains(uri) {
            return;
        }
        self.publish(BusEvent::WillDisposeModel(uri.clone()));
        for id in self.surfaces_showing(uri) {
            self.bind_model(id, None);
        }
        self.pump();
        self.registry.remove(uri);
        self.view_states.remove(uri);
    }

    /// Apply edits to `uri` as one undo step.
    pub fn apply_edits(&mut self, uri: &ModelUri, edits: &[SingleEdit]) -> Result<(), BridgeError> {
        if let Some(event) = self.registry.apply_edits(uri, edits)? {
            self.emit_content_change(event);
        }
        Ok(())
    }

    /// Undo the last step on `uri`. Returns whether anything changed.
    pub fn undo(&mut self, uri: &ModelUri) -> bool {
        let Some(event) = self.registry.get_mut(uri).and_then(|model| model.undo()) else {
            return false;
        };
        self.emit_content_change(event);
        true
    }

    /// Redo the last undone step on `uri`. Returns whether anything changed.
    pub fn redo(&mut self, uri: &ModelUri) -> bool {
        let Some(event) = self.registry.get_mut(uri).and_then(|model| model.redo()) else {
            return false;
        };
        self.emit_content_change(event);
        true
    }

    /// Move the cursor of the focused surface. The position is clamped into its model.
    pub fn set_cursor(&mut self, position: Position) {
        let Some(id) = self.focused_surface_id() else {
            return;
        };
        let Some(position) = self
            .surfaces
            .get(&id)
            .and_then(Surface::model)
            .and_then(|uri| self.registry.get(uri))
            .map(|model| model.validate_position(position))
        else {
            return;
        };
        if let Some(surface) = self.surfaces.get_mut(&id)
            && surface.set_position(position)
        {
            self.publish(BusEvent::CursorMoved(id));
            self.pump();
        }
    }

    /// Scroll the focused surface.
    pub fn set_scroll_position(&mut self, top: u32, left: u32) {
        if let Some(surface) = self
            .focused_surface_id()
            .and_then(|id| self.surfaces.get_mut(&id))
        {
            surface.set_scroll(top, left);
        }
    }

    /// Record the folded regions of the focused surface (start lines, 1-based).
    ///
    /// Lines past the end of the model are dropped.
    pub fn set_folded_lines(&mut self, lines: Vec<usize>) {
        let Some(id) = self.focused_surface_id() else {
            return;
        };
        let Some(line_count) = self
            .surfaces
            .get(&id)
            .and_then(Surface::model)
            .and_then(|uri| self.registry.get(uri))
            .map(|model| model.line_count())
        else {
            return;
        };
        if let Some(surface) = self.surfaces.get_mut(&id) {
            surface.set_folded_lines(
                lines
                    .into_iter()
                    .filter(|line| (1..=line_count).contains(line))
                    .collect(),
            );
        }
    }

    /// Replace the markers `owner` holds for `uri`.
    pub fn set_model_markers(&mut self, owner: &str, uri: &ModelUri, markers: Vec<MarkerData>) {
        if self.markers.change(owner, uri, markers) {
            self.publish(BusEvent::MarkersChanged);
            self.pump();
        }
    }

    /// Create or update the baseline of `uri` and refresh its dirty diff.
    pub fn provide_baseline(&mut self, uri: &ModelUri, content: &str) {
        let baseline = uri.baseline(&self.config.baseline_prefix);
        let upsert = self
            .registry
            .get_or_create(&baseline, Some(content), Some(PLAINTEXT));
        if upsert.created {
            tracing::debug!(uri = %uri, "baseline created");
        }
        self.render_dirty_diff(uri);
    }

    /// Remove the dirty-diff decorations of the normal editor.
    pub fn invalidate_decorations(&mut self) {
        let ViewMode::Normal { editor } = self.view else {
            return;
        };
        if let Some(surface) = self.surfaces.get_mut(&editor) {
            self.renderer.clear(surface.decorations_mut());
        }
    }

    /// Store a theme in its colour-scheme slot and re-apply.
    pub fn apply_theme(&mut self, theme: Theme) {
        self.themes.store(theme);
        self.apply_current_theme();
    }

    /// Record the host colour scheme, re-applying on change.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        if self.themes.set_scheme(scheme) {
            self.apply_current_theme();
        }
    }

    pub(crate) fn apply_current_theme(&self) {
        if let Some(applied) = self.themes.resolve() {
            self.notify(HostEvent::ThemeApplied {
                base: applied.base,
                configuration: applied.configuration,
            });
        }
    }

    /// Enable or disable modal editing on the normal editor.
    pub fn toggle_modal_editing(&mut self, enabled: bool) {
        if enabled {
            let surface = match self.view {
                ViewMode::Normal { editor } => Some(editor),
                _ => None,
            };
            for event in self.modal.enable(surface) {
                self.notify(event);
            }
        } else if self.modal.disable() {
            tracing::debug!("modal editing session disposed");
        }
    }

    /// Mode change reported by the modal engine.
    pub fn modal_mode_changed(&self, mode: &str, sub_mode: Option<&str>) {
        if let Some(event) = self.modal.mode_changed(mode, sub_mode) {
            self.notify(event);
        }
    }

    /// Pending modal key sequence.
    pub fn modal_key_buffer(&self, buffer: &str) {
        if let Some(event) = self.modal.key_buffer(buffer) {
            self.notify(event);
        }
    }

    /// Modal command line visibility.
    pub fn modal_visibility(&self, is_visible: bool) {
        if let Some(event) = self.modal.set_visible(is_visible) {
            self.notify(event);
        }
    }

    /// Modal command input closed.
    pub fn modal_close_input(&self) {
        if let Some(event) = self.modal.close_input() {
            self.notify(event);
        }
    }

    /// Modal status cleared.
    pub fn modal_clear(&self) {
        if let Some(event) = self.modal.clear() {
            self.notify(event);
        }
    }

    /// The host's text input gained focus.
    pub fn input_focused(&self) {
        if self.normal_surface().is_some_and(Surface::focus_armed) {
            self.notify(HostEvent::Focus);
        }
    }

    /// A link inside the editor was activated.
    pub fn open_link(&self, url: &str) {
        if self.listeners.is_empty() {
            return;
        }
        self.notify(HostEvent::OpenExternalUrl {
            url: url.to_string(),
        });
    }

    /// The language service for `language` went away and will not be restarted.
    pub fn language_service_dropped(&self, language: &str) {
        tracing::info!(language, "language service connection dropped");
        self.notify(HostEvent::LanguageServiceDropped {
            language_identifier: language.to_string(),
        });
    }

    pub(crate) fn surfaces_showing(&self, uri: &ModelUri) -> Vec<SurfaceId> {
        self.surfaces
            .values()
            .filter(|surface| surface.model() == Some(uri))
            .map(Surface::id)
            .collect()
    }

    /// Bind a model to a surface and queue the switch for the router.
    pub(crate) fn bind_model(&mut self, id: SurfaceId, uri: Option<ModelUri>) {
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return;
        };
        let outgoing = surface.save_view_state();
        if let Some(switch) = surface.set_model(uri) {
            self.publish(BusEvent::ModelSwitched {
                surface: id,
                switch,
                outgoing,
            });
        }
    }

    pub(crate) fn emit_content_change(&mut self, event: ContentChangeEvent) {
        self.markers.adjust_for_change(&event);
        self.publish(BusEvent::ContentChanged(event));
        self.pump();
    }

    /// Diff `uri` against its baseline and render the result on the normal editor.
    ///
    /// Skipped in diff mode, when `uri` is not the model shown, or without a baseline.
    pub(crate) fn render_dirty_diff(&mut self, uri: &ModelUri) {
        let ViewMode::Normal { editor } = self.view else {
            return;
        };
        if self.surfaces.get(&editor).and_then(Surface::model) != Some(uri) {
            tracing::debug!(uri = %uri, "dirty diff skipped for inactive model");
            return;
        }
        let baseline = uri.baseline(&self.config.baseline_prefix);
        let options = DiffOptions {
            ignore_trim_whitespace: self.config.ignore_trim_whitespace,
            time_budget: self.config.diff_time_budget(),
        };
        let Some(result) = compute_dirty_diff(&self.registry, &baseline, uri, &options) else {
            return;
        };
        self.diff_runs += 1;
        if result.quit_early {
            tracing::warn!(uri = %uri, "dirty diff exceeded its time budget; showing partial result");
        }
        if let Some(surface) = self.surfaces.get_mut(&editor) {
            self.renderer.render(surface.decorations_mut(), &result.changes);
        }
    }
}

impl std::fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeContext")
            .field("view", &self.view)
            .field("models", &self.registry.len())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
