//! View-state machine over the four portal panels.
//!
//! Pure state: no I/O here. `switch_to` reports which refresh the newly
//! shown panel requires; the portal performs it (and enforces the login
//! guard) so this machine stays unit-testable without a backend.

use serde::Serialize;

/// The four mutually exclusive panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Upload,
    Messages,
    Records,
    Appointments,
}

impl View {
    /// The data load a panel needs when it becomes visible.
    /// Upload is a pure input form and loads nothing.
    pub fn refresh_kind(&self) -> Option<RefreshKind> {
        match self {
            View::Upload => None,
            View::Messages => Some(RefreshKind::Messages),
            View::Records => Some(RefreshKind::Records),
            View::Appointments => Some(RefreshKind::Appointments),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Messages,
    Records,
    Appointments,
}

/// Outcome of a switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested panel is already visible; nothing to do.
    AlreadyActive,
    /// Panel changed; the new panel may require a data refresh.
    Switched { refresh: Option<RefreshKind> },
}

pub struct ViewState {
    current: View,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            current: View::Upload,
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn switch_to(&mut self, view: View) -> Transition {
        if view == self.current {
            return Transition::AlreadyActive;
        }
        tracing::debug!(from = ?self.current, to = ?view, "panel switch");
        self.current = view;
        Transition::Switched {
            refresh: view.refresh_kind(),
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_upload() {
        assert_eq!(ViewState::new().current(), View::Upload);
    }

    #[test]
    fn switch_to_same_view_is_noop() {
        let mut state = ViewState::new();
        assert_eq!(state.switch_to(View::Upload), Transition::AlreadyActive);
        assert_eq!(state.current(), View::Upload);
    }

    #[test]
    fn switch_to_records_requests_record_refresh() {
        let mut state = ViewState::new();
        assert_eq!(
            state.switch_to(View::Records),
            Transition::Switched {
                refresh: Some(RefreshKind::Records)
            }
        );
        assert_eq!(state.current(), View::Records);
    }

    #[test]
    fn switch_back_to_upload_requests_no_refresh() {
        let mut state = ViewState::new();
        state.switch_to(View::Messages);
        assert_eq!(
            state.switch_to(View::Upload),
            Transition::Switched { refresh: None }
        );
    }

    #[test]
    fn every_data_panel_declares_its_refresh() {
        assert_eq!(View::Messages.refresh_kind(), Some(RefreshKind::Messages));
        assert_eq!(View::Records.refresh_kind(), Some(RefreshKind::Records));
        assert_eq!(
            View::Appointments.refresh_kind(),
            Some(RefreshKind::Appointments)
        );
        assert_eq!(View::Upload.refresh_kind(), None);
    }
}
