//! Record list synchronizer.
//!
//! A refresh replaces the whole displayed list — no incremental diffing.
//! Fetching and view-model construction are split so the rendering rules
//! (sort order, blob-reference derivation, media classification) are
//! testable without a backend.

use chrono::{DateTime, Utc};

use crate::config::BLOB_PATH_PREFIX;
use crate::models::{MediaKind, Record, RecordStatus};
use crate::routes;
use crate::transport::{self, Transport, TransportError};

/// Fetch the full record collection for a patient.
pub fn fetch_records(
    transport: &dyn Transport,
    patient_id: &str,
) -> Result<Vec<Record>, TransportError> {
    let body = transport.get(&routes::records(patient_id))?;
    transport::parse_list_envelope(body, "records")
}

/// Newest first; ties keep the backend's order.
pub fn sort_records(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

/// Derive the storage reference used to build a media URL.
///
/// Prefer the explicit `blobName`; otherwise strip the known path prefix
/// from the full blob URL. Anything else yields an empty reference.
pub fn display_reference(record: &Record) -> String {
    if let Some(name) = record.blob_name.as_deref() {
        return name.to_string();
    }
    record
        .blob_url
        .as_deref()
        .and_then(|url| url.split_once(BLOB_PATH_PREFIX))
        .map(|(_, suffix)| suffix.to_string())
        .unwrap_or_default()
}

/// One record prepared for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    pub id: String,
    pub file_name: String,
    pub uploaded_at: String,
    pub status: RecordStatus,
    pub status_label: String,
    pub media: MediaKind,
    pub media_url: Option<String>,
    pub note: Option<String>,
    pub gp_notes: Option<String>,
}

/// The records panel in one of its three distinct shapes. `Empty` and
/// `Retry` must never be conflated: zero records is a normal state,
/// a failed refresh is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordsPanel {
    Empty,
    List(Vec<RecordView>),
    Retry { message: String },
}

/// Pure view-model builder for one record.
pub fn build_record_view(record: &Record, base_url: &str) -> RecordView {
    let reference = display_reference(record);
    let media_url = if reference.is_empty() {
        None
    } else {
        Some(routes::media(base_url, &reference))
    };

    RecordView {
        id: record.id.clone(),
        file_name: record
            .original_name
            .clone()
            .unwrap_or_else(|| "Unnamed file".to_string()),
        uploaded_at: format_timestamp(record.created_at),
        status: record.status,
        status_label: record.status.label(),
        media: MediaKind::classify(record.content_type.as_deref()),
        media_url,
        note: record.note.clone(),
        gp_notes: record.gp_notes.clone(),
    }
}

/// Sort and convert a fetched record set into its panel shape.
pub fn build_records_panel(records: Vec<Record>, base_url: &str) -> RecordsPanel {
    if records.is_empty() {
        return RecordsPanel::Empty;
    }
    let views = sort_records(records)
        .iter()
        .map(|r| build_record_view(r, base_url))
        .collect();
    RecordsPanel::List(views)
}

fn format_timestamp(epoch_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}
