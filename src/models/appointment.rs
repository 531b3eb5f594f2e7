use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::de_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Type/category label ("Follow-up", "Vaccination", ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub date: NaiveDate,
    pub time: String,
    /// Free-form backend status ("pending", "confirmed", "scheduled", ...).
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub video_link: Option<String>,
}
