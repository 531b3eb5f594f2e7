//! Message synchronizer between patient and GP.
//!
//! Refresh renders messages in server-provided (chronological) order and
//! acknowledges unread ones; the unread badge then recomputes from zero
//! without re-verifying against the server (client-optimistic).
//!
//! Sending is optimistic too: on success the message is appended locally
//! with `unread = false` before any further round-trip. A failed send
//! leaves the composer draft intact so the user can retry.

use chrono::Utc;
use serde_json::{json, Value};

use crate::models::{Message, Sender};
use crate::routes;
use crate::transport::{self, Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Message content must not be empty")]
    EmptyDraft,
    #[error("Backend rejected the message: {0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Holds the message being typed. The draft survives every failure path
/// and clears only on a confirmed send.
#[derive(Default)]
pub struct MessageComposer {
    draft: String,
}

impl MessageComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    fn clear(&mut self) {
        self.draft.clear();
    }
}

/// Result of a conversation refresh.
#[derive(Debug)]
pub struct MessagesRefresh {
    /// Server order preserved; all flipped to read.
    pub messages: Vec<Message>,
    /// Recomputed after acknowledgement — always zero post-refresh.
    pub unread_badge: u32,
    /// How many acknowledgement requests were issued.
    pub marked_read: usize,
}

pub fn fetch_messages(
    transport: &dyn Transport,
    patient_id: &str,
) -> Result<Vec<Message>, TransportError> {
    let body = transport.get(&routes::messages(patient_id))?;
    transport::parse_list_envelope(body, "messages")
}

/// Fetch the conversation and acknowledge anything unread.
///
/// Acknowledgement failures are logged and skipped — the local flip
/// stands, and the next refresh retries whatever the server still
/// considers unread.
pub fn refresh(
    transport: &dyn Transport,
    patient_id: &str,
) -> Result<MessagesRefresh, TransportError> {
    let mut messages = fetch_messages(transport, patient_id)?;

    let unread_ids: Vec<String> = messages
        .iter()
        .filter(|m| m.unread)
        .map(|m| m.id.clone())
        .collect();

    for id in &unread_ids {
        if let Err(e) = transport.put(&routes::mark_message_read(id), &json!({})) {
            tracing::warn!(message_id = %id, error = %e, "mark-as-read failed");
        }
    }
    for message in &mut messages {
        message.unread = false;
    }

    Ok(MessagesRefresh {
        messages,
        unread_badge: 0,
        marked_read: unread_ids.len(),
    })
}

/// Post the composer's draft as the patient.
///
/// Rejects an empty/whitespace draft locally before any network call.
/// On success the draft clears and the optimistic local copy is
/// returned, already marked read.
pub fn send(
    transport: &dyn Transport,
    patient_id: &str,
    composer: &mut MessageComposer,
) -> Result<Message, SendError> {
    let content = composer.draft().trim().to_string();
    if content.is_empty() {
        return Err(SendError::EmptyDraft);
    }

    let body = json!({
        "patientId": patient_id,
        "content": content,
        "sender": Sender::Patient.as_str(),
    });
    let reply = transport.post_json(&routes::send_message(), &body)?;

    if !reply.get("success").and_then(Value::as_bool).unwrap_or(false) {
        let reason = reply
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("send was not confirmed")
            .to_string();
        return Err(SendError::Rejected(reason));
    }

    let id = match reply.get("messageId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "local".to_string(),
    };

    composer.clear();
    Ok(Message {
        id,
        patient_id: Some(patient_id.to_string()),
        sender: Sender::Patient,
        content,
        timestamp: Utc::now(),
        unread: false,
        file_url: None,
        file_name: None,
    })
}
