//! Canonical REST routes for the portal backend.
//!
//! Earlier drafts of the front-end disagreed on several paths
//! (`/messages/<id>` vs `/messages?patientId=`, `/appointments/<id>` for a
//! patient-scoped listing). This module fixes one convention for the whole
//! crate: collections are listed with a `patientId` query parameter, single
//! resources are addressed by path segment.

pub fn patient(id: &str) -> String {
    format!("/patients/{id}")
}

pub fn records(patient_id: &str) -> String {
    format!("/records?patientId={patient_id}")
}

pub fn record(id: &str) -> String {
    format!("/record/{id}")
}

pub fn upload() -> String {
    "/upload".to_string()
}

pub fn messages(patient_id: &str) -> String {
    format!("/messages?patientId={patient_id}")
}

pub fn send_message() -> String {
    "/messages".to_string()
}

pub fn mark_message_read(message_id: &str) -> String {
    format!("/messages/{message_id}/read")
}

pub fn appointments(patient_id: &str) -> String {
    format!("/appointments?patientId={patient_id}")
}

pub fn request_appointment() -> String {
    "/appointments".to_string()
}

pub fn appointment(id: &str) -> String {
    format!("/appointments/{id}")
}

/// Media is served as direct binary content, not JSON — callers build a
/// full URL from it rather than going through the transport primitives.
pub fn media(base_url: &str, blob_path: &str) -> String {
    format!("{base_url}/media/{blob_path}")
}

pub fn health() -> String {
    "/health".to_string()
}
