//! Change-event router.
//!
//! Mutations do not call handlers directly. They queue a [`BusEvent`] and the context pumps the
//! queue, so handlers run in emission order and a handler that triggers further events never
//! re-enters another handler. Handlers only fire for surfaces that have listeners attached.

use crate::context::BridgeContext;
use crate::host::HostEvent;
use crate::model::{ContentChangeEvent, Position};
use crate::surface::{ModelSwitch, Surface, SurfaceId, SurfaceRole, ViewState};
use crate::uri::ModelUri;

/// Internal event queued by mutations.
#[derive(Debug, Clone)]
pub(crate) enum BusEvent {
    /// A surface was bound to a different model. `outgoing` is the state it had before.
    ModelSwitched {
        surface: SurfaceId,
        switch: ModelSwitch,
        outgoing: ViewState,
    },
    /// A surface cursor moved.
    CursorMoved(SurfaceId),
    /// A model changed.
    ContentChanged(ContentChangeEvent),
    /// The marker set changed.
    MarkersChanged,
    /// A model is about to be disposed.
    WillDisposeModel(ModelUri),
}

impl BridgeContext {
    pub(crate) fn publish(&mut self, event: BusEvent) {
        self.bus.push_back(event);
    }

    /// Drain the queue.
    pub(crate) fn pump(&mut self) {
        while let Some(event) = self.bus.pop_front() {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: BusEvent) {
        match event {
            BusEvent::ModelSwitched {
                surface,
                switch,
                outgoing,
            } => {
                if self.listeners.contains(&surface) {
                    self.on_model_switched(surface, switch, outgoing);
                }
            }
            BusEvent::CursorMoved(surface) => {
                if !self.listeners.contains(&surface) {
                    return;
                }
                if let Some(position) = self.surfaces.get(&surface).map(Surface::position) {
                    self.notify_cursor(position);
                }
            }
            BusEvent::ContentChanged(event) => {
                let targets = self
                    .listeners
                    .iter()
                    .filter(|id| {
                        self.surfaces.get(id).and_then(Surface::model) == Some(&event.uri)
                    })
                    .count();
                for _ in 0..targets {
                    self.on_content_changed(&event);
                }
            }
            BusEvent::MarkersChanged => {
                for _ in 0..self.listeners.len() {
                    self.notify(HostEvent::MarkersUpdated {
                        markers: self.markers.all(),
                    });
                }
            }
            BusEvent::WillDisposeModel(uri) => {
                if self.listeners.is_empty() {
                    return;
                }
                let owner = self.config.marker_owner.clone();
                if self.markers.remove(&owner, &uri) {
                    self.publish(BusEvent::MarkersChanged);
                }
            }
        }
    }

    fn on_model_switched(&mut self, id: SurfaceId, switch: ModelSwitch, outgoing: ViewState) {
        let Some(surface) = self.surfaces.get(&id) else {
            return;
        };
        if surface.role() != SurfaceRole::Standalone {
            return;
        }
        let Some(new) = switch.new else {
            return;
        };
        if let Some(old) = switch.old {
            self.view_states.insert(old, outgoing);
        }

        let restored = self.view_states.get(&new).cloned().map(|mut state| {
            if let Some(model) = self.registry.get(&new) {
                state.cursor = model.validate_position(state.cursor);
            }
            state
        });

        let Some(surface) = self.surfaces.get_mut(&id) else {
            return;
        };
        surface.decorations_mut().clear();
        self.renderer.reset();
        if let Some(state) = restored {
            surface.restore_view_state(&state);
        }
        surface.set_focus_armed(true);
        let position = surface.position();

        self.notify(HostEvent::DiffUpdateRequested {
            uri: new.to_string(),
        });
        self.notify_cursor(position);
    }

    fn on_content_changed(&mut self, event: &ContentChangeEvent) {
        let baseline = event.uri.baseline(&self.config.baseline_prefix);
        if self.registry.contains(&baseline) {
            self.render_dirty_diff(&event.uri);
        }
        if event.is_flush {
            return;
        }
        let Some(model) = self.registry.get(&event.uri) else {
            return;
        };

        // The reported span is the intersection of the edit ranges (pre-edit coordinates)
        // resolved against the post-edit text.
        let Some(start_line) = event
            .changes
            .iter()
            .map(|change| change.range.start_line_number)
            .max()
        else {
            return;
        };
        let end_line = event
            .changes
            .iter()
            .map(|change| change.range.end_line_number)
            .min()
            .unwrap_or(start_line);

        let start_offset = model.offset_at(Position::new(start_line, 0));
        let end_offset = if model.line_count() < end_line {
            start_offset
        } else {
            model.offset_at(Position::new(end_line, model.line_length(end_line)))
        };

        self.notify(HostEvent::ContentChanged {
            version_id: model.version(),
            uri: event.uri.to_string(),
            current_content: model.value(),
            start_offset,
            end_offset,
        });
    }

    fn notify_cursor(&self, position: Position) {
        self.notify(HostEvent::CursorPositionChanged {
            column: position.column,
            line_number: position.line_number,
        });
    }
}
