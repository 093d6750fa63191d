//! Modal (vim-style) editing status adapter.
//!
//! Key handling lives elsewhere; this adapter only tracks whether modal editing is enabled,
//! which surface the session is bound to, and turns mode changes into host notifications.

use crate::host::HostEvent;
use crate::surface::SurfaceId;

/// Display label for a mode as reported by the modal engine.
///
/// `sub_mode` only matters for `visual`.
pub fn mode_label(mode: &str, sub_mode: Option<&str>) -> String {
    if mode.eq_ignore_ascii_case("visual") {
        return match sub_mode {
            Some("linewise") => "--VISUAL LINE--".to_string(),
            Some("blockwise") => "--VISUAL BLOCK--".to_string(),
            _ => "--VISUAL--".to_string(),
        };
    }
    format!("--{}--", mode.to_uppercase())
}

/// Modal editing preference plus the live session.
#[derive(Debug, Default)]
pub struct ModalEditing {
    enabled: bool,
    session: Option<SurfaceId>,
}

impl ModalEditing {
    /// Disabled, no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the preference is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Surface the session is bound to.
    pub fn session(&self) -> Option<SurfaceId> {
        self.session
    }

    /// Turn modal editing on for `surface`.
    ///
    /// A no-op (no events) when a session already runs. Without a surface only the
    /// preference is recorded.
    pub fn enable(&mut self, surface: Option<SurfaceId>) -> Vec<HostEvent> {
        self.enabled = true;
        if self.session.is_some() {
            return Vec::new();
        }
        self.start(surface)
    }

    /// Turn modal editing off and drop the session. Returns whether a session was running.
    pub fn disable(&mut self) -> bool {
        self.enabled = false;
        self.session.take().is_some()
    }

    /// Drop the session bound to `surface` (the surface is being torn down).
    pub fn release(&mut self, surface: SurfaceId) -> bool {
        if self.session == Some(surface) {
            self.session = None;
            true
        } else {
            false
        }
    }

    /// Re-create the session on a new normal surface when the preference is on.
    pub fn attach(&mut self, surface: SurfaceId) -> Vec<HostEvent> {
        if !self.enabled || self.session.is_some() {
            return Vec::new();
        }
        self.start(Some(surface))
    }

    fn start(&mut self, surface: Option<SurfaceId>) -> Vec<HostEvent> {
        let Some(surface) = surface else {
            return Vec::new();
        };
        self.session = Some(surface);
        vec![HostEvent::ModalModeChanged {
            new_mode: mode_label("normal", None),
        }]
    }

    /// Mode change reported by the engine.
    pub fn mode_changed(&self, mode: &str, sub_mode: Option<&str>) -> Option<HostEvent> {
        self.session.map(|_| HostEvent::ModalModeChanged {
            new_mode: mode_label(mode, sub_mode),
        })
    }

    /// Pending key sequence.
    pub fn key_buffer(&self, buffer: &str) -> Option<HostEvent> {
        self.session.map(|_| HostEvent::ModalKeyBufferSet {
            buffer: buffer.to_string(),
        })
    }

    /// Command line visibility.
    pub fn set_visible(&self, is_visible: bool) -> Option<HostEvent> {
        self.session
            .map(|_| HostEvent::ModalVisibilitySet { is_visible })
    }

    /// Command input closed.
    pub fn close_input(&self) -> Option<HostEvent> {
        self.session.map(|_| HostEvent::ModalCloseInput)
    }

    /// Status cleared.
    pub fn clear(&self) -> Option<HostEvent> {
        self.session.map(|_| HostEvent::ModalClear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labels() {
        assert_eq!(mode_label("insert", None), "--INSERT--");
        assert_eq!(mode_label("visual", Some("linewise")), "--VISUAL LINE--");
        assert_eq!(mode_label("visual", Some("blockwise")), "--VISUAL BLOCK--");
        assert_eq!(mode_label("visual", None), "--VISUAL--");
        assert_eq!(mode_label("replace", None), "--REPLACE--");
    }

    #[test]
    fn test_enable_twice_is_noop() {
        let mut modal = ModalEditing::new();
        let events = modal.enable(Some(SurfaceId(1)));
        assert_eq!(
            events,
            vec![HostEvent::ModalModeChanged {
                new_mode: "--NORMAL--".into()
            }]
        );
        assert!(modal.enable(Some(SurfaceId(1))).is_empty());
    }

    #[test]
    fn test_session_follows_surface() {
        let mut modal = ModalEditing::new();
        modal.enable(Some(SurfaceId(1)));
        assert!(modal.release(SurfaceId(1)));
        assert!(modal.key_buffer("d").is_none());
        assert_eq!(modal.attach(SurfaceId(2)).len(), 1);
        assert_eq!(modal.session(), Some(SurfaceId(2)));
        assert!(modal.disable());
        assert!(modal.attach(SurfaceId(3)).is_empty());
    }
}
