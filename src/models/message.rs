use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de_id;
use super::enums::Sender;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}
