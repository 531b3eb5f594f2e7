//! GP-side record review.
//!
//! The clinician dashboard works on the same record collection as the
//! patient view but may re-fetch a single record, change its lifecycle
//! status, attach notes, delete it outright, and filter the list by
//! status. List rendering itself is shared with `records`.

use serde_json::{json, Value};

use crate::models::{Record, RecordStatus};
use crate::routes;
use crate::transport::{Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Backend rejected the change: {0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Status/notes change submitted from the review panel.
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub status: RecordStatus,
    pub gp_notes: Option<String>,
}

pub fn fetch_record(transport: &dyn Transport, record_id: &str) -> Result<Record, TransportError> {
    let body = transport.get(&routes::record(record_id))?;
    serde_json::from_value(body).map_err(|e| TransportError::Decode(e.to_string()))
}

/// Apply a review change; returns the updated record as the backend sees it.
pub fn update_review(
    transport: &dyn Transport,
    record_id: &str,
    update: &ReviewUpdate,
) -> Result<Record, ReviewError> {
    let body = json!({
        "status": update.status.as_str(),
        "gpNotes": update.gp_notes,
    });
    let reply = transport.put(&routes::record(record_id), &body)?;
    if let Some(error) = reply.get("error").and_then(Value::as_str) {
        return Err(ReviewError::Rejected(error.to_string()));
    }
    serde_json::from_value(reply)
        .map_err(|e| ReviewError::Transport(TransportError::Decode(e.to_string())))
}

pub fn delete_record(transport: &dyn Transport, record_id: &str) -> Result<(), ReviewError> {
    let reply = transport.delete(&routes::record(record_id))?;
    if let Some(error) = reply.get("error").and_then(Value::as_str) {
        return Err(ReviewError::Rejected(error.to_string()));
    }
    Ok(())
}

/// Dashboard status filter; `None` shows everything.
pub fn filter_by_status(records: &[Record], status: Option<RecordStatus>) -> Vec<Record> {
    match status {
        None => records.to_vec(),
        Some(wanted) => records
            .iter()
            .filter(|r| r.status == wanted)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fixture::FixtureTransport;

    fn record_json(id: i64, status: &str) -> Value {
        json!({"id": id, "createdAt": 100, "status": status})
    }

    #[test]
    fn fetch_parses_single_record() {
        let transport = FixtureTransport::new();
        transport.push_ok(record_json(7, "under_review"));

        let record = fetch_record(&transport, "7").unwrap();
        assert_eq!(record.id, "7");
        assert_eq!(record.status, RecordStatus::UnderReview);
        assert_eq!(transport.calls()[0], ("GET".to_string(), "/record/7".to_string()));
    }

    #[test]
    fn update_sends_status_and_notes_and_parses_reply() {
        let transport = FixtureTransport::new();
        transport.push_ok(record_json(7, "reviewed"));

        let updated = update_review(
            &transport,
            "7",
            &ReviewUpdate {
                status: RecordStatus::Reviewed,
                gp_notes: Some("Healing well.".to_string()),
            },
        )
        .unwrap();
        assert_eq!(updated.status, RecordStatus::Reviewed);
        assert_eq!(transport.calls()[0], ("PUT".to_string(), "/record/7".to_string()));
    }

    #[test]
    fn update_surfaces_error_envelope() {
        let transport = FixtureTransport::new();
        transport.push_ok(json!({"error": "record locked"}));

        let result = update_review(
            &transport,
            "7",
            &ReviewUpdate {
                status: RecordStatus::Reviewed,
                gp_notes: None,
            },
        );
        assert!(matches!(result, Err(ReviewError::Rejected(_))));
    }

    #[test]
    fn delete_hits_resource_route() {
        let transport = FixtureTransport::new();
        transport.push_ok(json!({"success": true}));

        delete_record(&transport, "7").unwrap();
        assert_eq!(
            transport.calls()[0],
            ("DELETE".to_string(), "/record/7".to_string())
        );
    }

    #[test]
    fn filter_none_keeps_everything() {
        let records: Vec<Record> = serde_json::from_value(json!([
            record_json(1, "pending"),
            record_json(2, "reviewed"),
        ]))
        .unwrap();
        assert_eq!(filter_by_status(&records, None).len(), 2);
    }

    #[test]
    fn filter_selects_matching_status_only() {
        let records: Vec<Record> = serde_json::from_value(json!([
            record_json(1, "pending"),
            record_json(2, "reviewed"),
            record_json(3, "pending"),
        ]))
        .unwrap();
        let filtered = filter_by_status(&records, Some(RecordStatus::Pending));
        let ids: Vec<&str> = filtered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }
}
