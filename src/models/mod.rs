pub mod appointment;
pub mod enums;
pub mod message;
pub mod patient;
pub mod record;

pub use appointment::Appointment;
pub use enums::{MediaKind, RecordStatus, Sender};
pub use message::Message;
pub use patient::Patient;
pub use record::Record;

/// Model-level parse failures.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Backend ids arrive as JSON numbers in some drafts and strings in
/// others. Normalize both to `String`.
pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let value = serde_json::Value::deserialize(deserializer)?;
    id_from_value(value).map_err(serde::de::Error::custom)
}

/// [`de_id`] for optional id fields; absent and `null` both read as `None`.
pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => id_from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn id_from_value(value: serde_json::Value) -> Result<String, String> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("expected string or number id, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize)]
    struct WithId {
        #[serde(deserialize_with = "de_id")]
        id: String,
    }

    #[test]
    fn numeric_id_normalized_to_string() {
        let parsed: WithId = serde_json::from_value(serde_json::json!({"id": 42})).unwrap();
        assert_eq!(parsed.id, "42");
    }

    #[test]
    fn string_id_passes_through() {
        let parsed: WithId = serde_json::from_value(serde_json::json!({"id": "R-7"})).unwrap();
        assert_eq!(parsed.id, "R-7");
    }

    #[test]
    fn boolean_id_rejected() {
        let parsed: Result<WithId, _> = serde_json::from_value(serde_json::json!({"id": true}));
        assert!(parsed.is_err());
    }

    #[derive(serde::Deserialize)]
    struct WithOptId {
        #[serde(default, deserialize_with = "de_opt_id")]
        id: Option<String>,
    }

    #[test]
    fn optional_numeric_id_normalized_to_string() {
        let parsed: WithOptId = serde_json::from_value(serde_json::json!({"id": 42})).unwrap();
        assert_eq!(parsed.id.as_deref(), Some("42"));
    }

    #[test]
    fn absent_and_null_optional_ids_read_as_none() {
        let absent: WithOptId = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(absent.id.is_none());
        let null: WithOptId = serde_json::from_value(serde_json::json!({"id": null})).unwrap();
        assert!(null.id.is_none());
    }
}
