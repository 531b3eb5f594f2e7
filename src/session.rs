//! Session store — the single source of truth for "is a user logged in".
//!
//! Holds the active patient id plus cached profile fields for the lifetime
//! of the host session. Every data-loading operation consults this store
//! before issuing a request.
//!
//! The store also issues **request-generation tokens**: a token captured
//! before a network call is only honoured if no login/logout happened while
//! the call was in flight. A completion carrying a stale token must be
//! discarded rather than rendered, so a slow response for a previous
//! patient can never overwrite the current patient's view.

use crate::models::Patient;
use crate::routes;
use crate::transport::{Transport, TransportError};

/// Session-level failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Patient id must not be empty")]
    EmptyPatientId,
    #[error("Patient id not recognized")]
    InvalidPatient,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Cached fields for the logged-in patient.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub patient_id: String,
    pub name: String,
    pub gp_name: Option<String>,
    pub unread_messages: u32,
}

/// Capture of "who was logged in when this request started".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    patient_id: String,
    generation: u64,
}

impl SessionToken {
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }
}

#[derive(Default)]
pub struct SessionStore {
    active: Option<ActiveSession>,
    generation: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the id, fetch the profile, and activate the session.
    ///
    /// On any failure — empty id, transport error, or the backend's
    /// not-found sentinel — prior state is left untouched.
    pub fn login(
        &mut self,
        transport: &dyn Transport,
        patient_id: &str,
    ) -> Result<&ActiveSession, SessionError> {
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(SessionError::EmptyPatientId);
        }

        let body = transport
            .get(&routes::patient(patient_id))
            .map_err(|e| match e {
                TransportError::Http { status: 404, .. } => SessionError::InvalidPatient,
                other => SessionError::Transport(other),
            })?;
        let profile: Patient = serde_json::from_value(body)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        if profile.is_unknown() {
            return Err(SessionError::InvalidPatient);
        }

        tracing::info!(patient_id, "session opened");
        self.generation += 1;
        Ok(&*self.active.insert(ActiveSession {
            patient_id: patient_id.to_string(),
            name: profile.name,
            gp_name: profile.gp_name,
            unread_messages: profile.unread_messages,
        }))
    }

    /// Clear all persisted fields in one step.
    pub fn logout(&mut self) {
        if self.active.take().is_some() {
            tracing::info!("session closed");
        }
        self.generation += 1;
    }

    /// Active patient id, if any.
    pub fn current(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.patient_id.as_str())
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    /// Overwrite the cached unread-message count.
    pub fn set_unread_messages(&mut self, count: u32) {
        if let Some(active) = self.active.as_mut() {
            active.unread_messages = count;
        }
    }

    /// Capture a token for an outgoing request. `None` when logged out.
    pub fn token(&self) -> Option<SessionToken> {
        self.active.as_ref().map(|s| SessionToken {
            patient_id: s.patient_id.clone(),
            generation: self.generation,
        })
    }

    /// True iff no login/logout happened since the token was captured.
    pub fn is_current(&self, token: &SessionToken) -> bool {
        token.generation == self.generation
            && self.current() == Some(token.patient_id.as_str())
    }
}
