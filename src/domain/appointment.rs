//! Appointments between a patient and a doctor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::new_id;
use super::user::UserProfile;

/// Appointment status.
///
/// Status writes are blind sets: the store never checks the prior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// A booked appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id")]
    pub id: String,
    /// Patient user id
    pub user_id: String,
    /// Doctor user id
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    pub symptoms: Option<String>,
    pub appointment_type: String,
    pub status: AppointmentStatus,
    /// Id of the prescription issued for this appointment, if any
    pub prescription: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Create a pending appointment.
    #[must_use]
    pub fn new(
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        symptoms: Option<String>,
        appointment_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            date: date.into(),
            time: time.into(),
            symptoms,
            appointment_type: appointment_type.into(),
            status: AppointmentStatus::Pending,
            prescription: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given user is the patient or the doctor.
    #[must_use]
    pub fn involves(&self, user_id: &str) -> bool {
        self.user_id == user_id || self.doctor_id == user_id
    }

    /// The participant a cancellation notice goes to: the doctor when the
    /// patient cancels, otherwise the patient.
    #[must_use]
    pub fn counterpart_of(&self, user_id: &str) -> &str {
        if self.user_id == user_id {
            &self.doctor_id
        } else {
            &self.user_id
        }
    }
}

/// An appointment with both participants joined in (null when deleted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetails {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: Option<UserProfile>,
    pub doctor_id: Option<UserProfile>,
    pub date: String,
    pub time: String,
    pub symptoms: Option<String>,
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub prescription: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentDetails {
    #[must_use]
    pub fn new(
        appointment: Appointment,
        patient: Option<UserProfile>,
        doctor: Option<UserProfile>,
    ) -> Self {
        Self {
            id: appointment.id,
            user_id: patient,
            doctor_id: doctor,
            date: appointment.date,
            time: appointment.time,
            symptoms: appointment.symptoms,
            appointment_type: appointment.appointment_type,
            status: appointment.status,
            prescription: appointment.prescription,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}
