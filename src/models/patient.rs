use serde::{Deserialize, Serialize};

/// Backend sentinel name returned for lookups that matched nothing.
pub const UNKNOWN_PATIENT_SENTINEL: &str = "Unknown Patient";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, deserialize_with = "super::de_opt_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub gp_name: Option<String>,
    #[serde(default)]
    pub unread_messages: u32,
}

impl Patient {
    /// True when the backend answered with its not-found sentinel
    /// instead of a real profile.
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_PATIENT_SENTINEL
    }
}
