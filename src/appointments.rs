//! Appointment synchronizer: list, request, cancel.
//!
//! Rescheduling was never wired to a backend contract and stays
//! unimplemented — callers get `Unsupported` rather than a guess.

use serde_json::{json, Value};

use crate::models::Appointment;
use crate::routes;
use crate::transport::{self, Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Rescheduling is not supported")]
    Unsupported,
    #[error("Backend rejected the request: {0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Fields for a new appointment request.
#[derive(Debug, Clone)]
pub struct AppointmentRequest {
    pub kind: String,
    pub date: chrono::NaiveDate,
    pub time: String,
    pub notes: Option<String>,
}

/// One appointment prepared for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentView {
    pub id: String,
    pub title: String,
    pub date: String,
    pub time: String,
    pub status: String,
    pub notes: Option<String>,
    pub video_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentsPanel {
    Empty,
    List(Vec<AppointmentView>),
    Retry { message: String },
}

pub fn fetch_appointments(
    transport: &dyn Transport,
    patient_id: &str,
) -> Result<Vec<Appointment>, TransportError> {
    let body = transport.get(&routes::appointments(patient_id))?;
    transport::parse_list_envelope(body, "appointments")
}

/// Post a new appointment request; returns the backend-issued id.
pub fn request(
    transport: &dyn Transport,
    patient_id: &str,
    request: &AppointmentRequest,
) -> Result<String, AppointmentError> {
    let mut body = json!({
        "patientId": patient_id,
        "type": request.kind,
        "date": request.date.to_string(),
        "time": request.time,
    });
    if let Some(notes) = &request.notes {
        body["notes"] = Value::String(notes.clone());
    }

    let reply = transport.post_json(&routes::request_appointment(), &body)?;
    if !reply.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return Err(AppointmentError::Rejected(
            reply
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request was not confirmed")
                .to_string(),
        ));
    }
    let id = match reply.get("appointmentId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    Ok(id)
}

pub fn cancel(transport: &dyn Transport, appointment_id: &str) -> Result<(), AppointmentError> {
    let reply = transport.delete(&routes::appointment(appointment_id))?;
    if let Some(error) = reply.get("error").and_then(Value::as_str) {
        return Err(AppointmentError::Rejected(error.to_string()));
    }
    Ok(())
}

/// Scope and semantics undefined in the backend contract.
pub fn reschedule(_appointment_id: &str) -> Result<(), AppointmentError> {
    Err(AppointmentError::Unsupported)
}

pub fn build_appointment_view(appointment: &Appointment) -> AppointmentView {
    AppointmentView {
        id: appointment.id.clone(),
        title: format!("{} Appointment", appointment.kind),
        date: appointment.date.format("%d %b %Y").to_string(),
        time: appointment.time.clone(),
        status: appointment.status.clone(),
        notes: appointment.notes.clone(),
        video_link: appointment.video_link.clone(),
    }
}

pub fn build_appointments_panel(appointments: &[Appointment]) -> AppointmentsPanel {
    if appointments.is_empty() {
        return AppointmentsPanel::Empty;
    }
    AppointmentsPanel::List(appointments.iter().map(build_appointment_view).collect())
}
