//! The portal client: one typed object owning the transport, session,
//! view state, and the per-panel synchronizers.
//!
//! Constructed once at startup with whichever [`Transport`] the host
//! selected (real HTTP client or a fixture double) and passed to view
//! code explicitly — no global registration, no host-name sniffing.
//!
//! Error policy follows the UI contract: failures of user-initiated
//! operations become dismissible notices carrying the server's message
//! when there is one; refresh failures additionally leave the affected
//! panel in its retry shape, which is never conflated with "empty".

use crate::appointments::{self, AppointmentError, AppointmentRequest, AppointmentsPanel};
use crate::config::PortalConfig;
use crate::messaging::{self, MessageComposer, MessagesRefresh, SendError};
use crate::models::{Appointment, Message, Record};
use crate::notice::{NoticeLevel, NoticeQueue};
use crate::records::{self, RecordsPanel};
use crate::routes;
use crate::session::{SessionError, SessionStore, SessionToken};
use crate::transport::{HttpTransport, ProgressCallback, Transport, TransportError};
use crate::upload::{UploadCandidate, UploadError, UploadOutcome, UploadPipeline, UploadReport};
use crate::view::{RefreshKind, Transition, View, ViewState};

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("No active session")]
    LoginRequired,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Appointment(#[from] AppointmentError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

pub struct Portal {
    transport: Box<dyn Transport>,
    base_url: String,
    session: SessionStore,
    view: ViewState,
    notices: NoticeQueue,
    composer: MessageComposer,
    pipeline: UploadPipeline,
    records_panel: RecordsPanel,
    messages: Vec<Message>,
    appointments_panel: AppointmentsPanel,
    unread_badge: u32,
}

impl Portal {
    /// Build a portal over an explicit transport (dependency injection
    /// seam — tests pass a fixture here).
    pub fn new(transport: Box<dyn Transport>, config: &PortalConfig) -> Self {
        Self {
            transport,
            base_url: config.base_url().to_string(),
            session: SessionStore::new(),
            view: ViewState::new(),
            notices: NoticeQueue::new(),
            composer: MessageComposer::new(),
            pipeline: UploadPipeline::new(),
            records_panel: RecordsPanel::Empty,
            messages: Vec::new(),
            appointments_panel: AppointmentsPanel::Empty,
            unread_badge: 0,
        }
    }

    /// Convenience constructor wiring the real HTTP transport.
    pub fn connect(config: &PortalConfig) -> Self {
        Self::new(Box::new(HttpTransport::new(config)), config)
    }

    // ── Session ─────────────────────────────────────────

    pub fn login(&mut self, patient_id: &str) -> Result<(), PortalError> {
        match self.session.login(self.transport.as_ref(), patient_id) {
            Ok(active) => {
                let text = format!("Welcome back, {}!", active.name);
                self.unread_badge = active.unread_messages;
                self.notices.push(NoticeLevel::Success, text);
                Ok(())
            }
            Err(SessionError::EmptyPatientId) => {
                self.notices
                    .push(NoticeLevel::Warning, "Please enter your Patient ID");
                Err(SessionError::EmptyPatientId.into())
            }
            Err(SessionError::InvalidPatient) => {
                self.notices.push(
                    NoticeLevel::Danger,
                    "Invalid Patient ID. Please check and try again.",
                );
                Err(SessionError::InvalidPatient.into())
            }
            Err(SessionError::Transport(e)) => {
                self.notices.push(
                    NoticeLevel::Danger,
                    "Unable to verify Patient ID. Please try again.",
                );
                Err(SessionError::Transport(e).into())
            }
        }
    }

    /// Clear the session and every cached panel, back to the login state.
    pub fn logout(&mut self) {
        self.session.logout();
        self.view = ViewState::new();
        self.records_panel = RecordsPanel::Empty;
        self.appointments_panel = AppointmentsPanel::Empty;
        self.messages.clear();
        self.unread_badge = 0;
        self.composer = MessageComposer::new();
        self.notices
            .push(NoticeLevel::Info, "You have been logged out successfully.");
    }

    pub fn current_patient(&self) -> Option<&str> {
        self.session.current()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // ── View switching ──────────────────────────────────

    pub fn current_view(&self) -> View {
        self.view.current()
    }

    /// Guarded panel switch: without an active session the user is sent
    /// back to the login prompt instead of transitioning.
    pub fn switch_to(&mut self, view: View) -> Result<(), PortalError> {
        if self.session.current().is_none() {
            self.notices.push(NoticeLevel::Warning, "Please login first");
            return Err(PortalError::LoginRequired);
        }
        if let Transition::Switched {
            refresh: Some(kind),
        } = self.view.switch_to(view)
        {
            self.run_refresh(kind);
        }
        Ok(())
    }

    fn run_refresh(&mut self, kind: RefreshKind) {
        match kind {
            RefreshKind::Records => self.refresh_records(),
            RefreshKind::Messages => self.refresh_messages(),
            RefreshKind::Appointments => self.refresh_appointments(),
        }
    }

    // ── Records ─────────────────────────────────────────

    /// Re-fetch and wholesale-replace the record list. A completion for
    /// a session that has since changed is discarded unrendered.
    pub fn refresh_records(&mut self) {
        let Some(token) = self.session.token() else {
            return;
        };
        let result = records::fetch_records(self.transport.as_ref(), token.patient_id());
        self.apply_records(token, result);
    }

    /// Render a completed records fetch, unless the session changed
    /// while it was in flight.
    fn apply_records(&mut self, token: SessionToken, result: Result<Vec<Record>, TransportError>) {
        if !self.session.is_current(&token) {
            tracing::warn!("discarding stale records response");
            return;
        }
        match result {
            Ok(fetched) => {
                self.records_panel = records::build_records_panel(fetched, &self.base_url);
            }
            Err(e) => {
                self.records_panel = RecordsPanel::Retry {
                    message: e.user_message(),
                };
                self.notices.push(
                    NoticeLevel::Danger,
                    "Error loading records. Please try again.",
                );
            }
        }
    }

    pub fn records_panel(&self) -> &RecordsPanel {
        &self.records_panel
    }

    // ── Messages ────────────────────────────────────────

    pub fn refresh_messages(&mut self) {
        let Some(token) = self.session.token() else {
            return;
        };
        let result = messaging::refresh(self.transport.as_ref(), token.patient_id());
        self.apply_messages(token, result);
    }

    fn apply_messages(
        &mut self,
        token: SessionToken,
        result: Result<MessagesRefresh, TransportError>,
    ) {
        if !self.session.is_current(&token) {
            tracing::warn!("discarding stale messages response");
            return;
        }
        match result {
            Ok(refreshed) => {
                self.messages = refreshed.messages;
                self.unread_badge = refreshed.unread_badge;
                self.session.set_unread_messages(refreshed.unread_badge);
            }
            Err(e) => {
                self.notices.push(NoticeLevel::Danger, e.user_message());
            }
        }
    }

    pub fn set_message_draft(&mut self, draft: impl Into<String>) {
        self.composer.set_draft(draft);
    }

    pub fn message_draft(&self) -> &str {
        self.composer.draft()
    }

    /// Send the current draft; on success the message is appended to the
    /// rendered list immediately. Any failure keeps the draft for retry.
    pub fn send_message(&mut self) -> Result<(), PortalError> {
        let Some(token) = self.session.token() else {
            self.notices.push(NoticeLevel::Warning, "Please login first");
            return Err(PortalError::LoginRequired);
        };
        match messaging::send(
            self.transport.as_ref(),
            token.patient_id(),
            &mut self.composer,
        ) {
            Ok(message) => {
                self.messages.push(message);
                self.notices
                    .push(NoticeLevel::Success, "Message sent successfully");
                Ok(())
            }
            Err(SendError::EmptyDraft) => {
                self.notices
                    .push(NoticeLevel::Warning, "Please enter a message");
                Err(SendError::EmptyDraft.into())
            }
            Err(e) => {
                self.notices
                    .push(NoticeLevel::Danger, "Failed to send message");
                Err(e.into())
            }
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn unread_badge(&self) -> u32 {
        self.unread_badge
    }

    // ── Appointments ────────────────────────────────────

    pub fn refresh_appointments(&mut self) {
        let Some(token) = self.session.token() else {
            return;
        };
        let result = appointments::fetch_appointments(self.transport.as_ref(), token.patient_id());
        self.apply_appointments(token, result);
    }

    fn apply_appointments(
        &mut self,
        token: SessionToken,
        result: Result<Vec<Appointment>, TransportError>,
    ) {
        if !self.session.is_current(&token) {
            tracing::warn!("discarding stale appointments response");
            return;
        }
        match result {
            Ok(fetched) => {
                self.appointments_panel = appointments::build_appointments_panel(&fetched);
            }
            Err(e) => {
                self.appointments_panel = AppointmentsPanel::Retry {
                    message: e.user_message(),
                };
                self.notices.push(
                    NoticeLevel::Danger,
                    "Error loading appointments. Please try again.",
                );
            }
        }
    }

    pub fn appointments_panel(&self) -> &AppointmentsPanel {
        &self.appointments_panel
    }

    pub fn request_appointment(&mut self, request: &AppointmentRequest) -> Result<(), PortalError> {
        let Some(token) = self.session.token() else {
            self.notices.push(NoticeLevel::Warning, "Please login first");
            return Err(PortalError::LoginRequired);
        };
        match appointments::request(self.transport.as_ref(), token.patient_id(), request) {
            Ok(_) => {
                self.notices
                    .push(NoticeLevel::Success, "Appointment requested");
                self.refresh_appointments();
                Ok(())
            }
            Err(e) => {
                self.notices
                    .push(NoticeLevel::Danger, "Failed to request appointment");
                tracing::error!(error = %e, "appointment request failed");
                Err(e.into())
            }
        }
    }

    pub fn cancel_appointment(&mut self, appointment_id: &str) -> Result<(), PortalError> {
        if self.session.current().is_none() {
            self.notices.push(NoticeLevel::Warning, "Please login first");
            return Err(PortalError::LoginRequired);
        }
        match appointments::cancel(self.transport.as_ref(), appointment_id) {
            Ok(()) => {
                self.notices
                    .push(NoticeLevel::Success, "Appointment cancelled successfully");
                self.refresh_appointments();
                Ok(())
            }
            Err(e) => {
                self.notices
                    .push(NoticeLevel::Danger, "Failed to cancel appointment");
                tracing::error!(error = %e, "appointment cancel failed");
                Err(e.into())
            }
        }
    }

    // ── Upload ──────────────────────────────────────────

    /// Validate and upload, then on any non-empty success refresh the
    /// record list and land on the Records panel.
    pub fn upload_files(
        &mut self,
        candidates: Vec<UploadCandidate>,
        note: Option<String>,
        on_progress: ProgressCallback,
    ) -> Result<UploadReport, PortalError> {
        let Some(token) = self.session.token() else {
            self.notices.push(NoticeLevel::Warning, "Please login first");
            return Err(PortalError::LoginRequired);
        };

        let total = candidates.len();
        let run = self.pipeline.run(
            self.transport.as_ref(),
            token.patient_id(),
            candidates,
            note,
            on_progress,
        );
        self.pipeline.reset();

        let report = match run {
            Ok(report) => report,
            Err(UploadError::Validation(rejection)) => {
                self.notices.push(NoticeLevel::Danger, rejection.to_string());
                return Err(UploadError::Validation(rejection).into());
            }
            Err(busy) => return Err(busy.into()),
        };

        match report.outcome {
            UploadOutcome::Succeeded => {
                self.notices.push(
                    NoticeLevel::Success,
                    format!("{} file(s) uploaded successfully!", report.uploaded_count()),
                );
            }
            UploadOutcome::PartiallyFailed => {
                self.notices.push(
                    NoticeLevel::Warning,
                    format!(
                        "{} of {} files uploaded. Some files failed.",
                        report.uploaded_count(),
                        total
                    ),
                );
            }
            UploadOutcome::Failed => {
                self.notices.push(NoticeLevel::Danger, "Upload failed");
            }
        }

        if report.uploaded_count() > 0 {
            self.view.switch_to(View::Records);
            self.refresh_records();
        }
        Ok(report)
    }

    // ── Misc ────────────────────────────────────────────

    /// Backend liveness probe.
    pub fn health_check(&self) -> bool {
        self.transport.get(&routes::health()).is_ok()
    }

    /// Live (unexpired) notices, oldest first.
    pub fn notices(&mut self) -> &[crate::notice::Notice] {
        self.notices.live()
    }
}
