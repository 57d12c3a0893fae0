//! Prescriptions issued by doctors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::new_id;
use super::user::UserProfile;

/// One medication entry. The structure is up to the prescribing client.
pub type Medication = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(rename = "_id")]
    pub id: String,
    pub appointment_id: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub patient_id: String,
    pub diagnosis: String,
    pub medications: Vec<Medication>,
    pub instructions: String,
    pub follow_up_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prescription {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        appointment_id: impl Into<String>,
        doctor_id: impl Into<String>,
        doctor_name: impl Into<String>,
        patient_id: impl Into<String>,
        diagnosis: impl Into<String>,
        medications: Vec<Medication>,
        instructions: impl Into<String>,
        follow_up_date: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            appointment_id: appointment_id.into(),
            doctor_id: doctor_id.into(),
            doctor_name: doctor_name.into(),
            patient_id: patient_id.into(),
            diagnosis: diagnosis.into(),
            medications,
            instructions: instructions.into(),
            follow_up_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A prescription with the participants that could be resolved.
#[derive(Debug, Clone, Serialize)]
pub struct PrescriptionDetails {
    #[serde(flatten)]
    pub prescription: Prescription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<UserProfile>,
}
