use serde::{Deserialize, Serialize};

use super::de_id;
use super::enums::RecordStatus;

/// One uploaded medical-evidence file plus clinician review metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    /// Backend-assigned storage reference, when the backend sends it directly.
    #[serde(default)]
    pub blob_name: Option<String>,
    /// Full blob URL; older drafts of the backend send this instead of `blobName`.
    #[serde(default)]
    pub blob_url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Seconds since epoch.
    pub created_at: i64,
    #[serde(default, deserialize_with = "de_status")]
    pub status: RecordStatus,
    #[serde(default)]
    pub gp_notes: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Missing, null, or unrecognized status values all read as `Pending`.
fn de_status<'de, D>(deserializer: D) -> Result<RecordStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(RecordStatus::classify(raw.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_status_defaults_to_pending() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "id": 1,
            "createdAt": 100,
            "status": null,
        }))
        .unwrap();
        assert_eq!(record.status, RecordStatus::Pending);
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "id": "R-1",
            "createdAt": 100,
        }))
        .unwrap();
        assert_eq!(record.status, RecordStatus::Pending);
    }

    #[test]
    fn known_status_parses() {
        let record: Record = serde_json::from_value(serde_json::json!({
            "id": 2,
            "createdAt": 200,
            "status": "reviewed",
            "originalName": "scan.png",
            "contentType": "image/png",
            "blobName": "abc123.png",
        }))
        .unwrap();
        assert_eq!(record.status, RecordStatus::Reviewed);
        assert_eq!(record.id, "2");
        assert_eq!(record.blob_name.as_deref(), Some("abc123.png"));
    }
}
