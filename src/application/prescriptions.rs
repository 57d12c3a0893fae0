//! Prescription service.

use serde::Deserialize;

use super::accounts::Caller;
use super::notifications::NotificationService;
use crate::domain::{Medication, NotificationKind, Prescription, PrescriptionDetails, UserProfile};
use crate::ports::Repositories;
use crate::{Result, ServiceError};

const LIST_LIMIT: usize = 100;

/// `POST /prescription/create` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionRequest {
    pub appointment_id: String,
    pub patient_id: String,
    pub diagnosis: String,
    pub medications: Vec<Medication>,
    pub instructions: String,
    #[serde(default)]
    pub follow_up_date: Option<String>,
}

/// Service for prescriptions.
#[derive(Clone)]
pub struct PrescriptionService {
    repos: Repositories,
    notifier: NotificationService,
}

impl PrescriptionService {
    pub fn new(repos: Repositories, notifier: NotificationService) -> Self {
        Self { repos, notifier }
    }

    /// Issue a prescription, attach it to its appointment and notify the
    /// patient. Returns the prescription id.
    ///
    /// The attach is a second write; neither the appointment nor the patient
    /// is checked. If the attach fails the prescription stays stored and the
    /// patient is not notified.
    ///
    /// # Errors
    /// `Forbidden` unless the caller's stored user is a doctor.
    pub fn create(&self, caller: &Caller, request: PrescriptionRequest) -> Result<String> {
        if !caller.is_doctor() {
            return Err(ServiceError::Forbidden(
                "Only doctors can create prescriptions".to_string(),
            ));
        }

        let prescription = Prescription::new(
            request.appointment_id,
            caller.id(),
            format!("Dr. {}", caller.user.full_name()),
            request.patient_id,
            request.diagnosis,
            request.medications,
            request.instructions,
            request.follow_up_date,
        );
        self.repos.prescriptions.insert(&prescription)?;
        self.repos
            .appointments
            .set_prescription(&prescription.appointment_id, &prescription.id)?;
        tracing::info!(
            "Prescription {} issued by {} for appointment {}",
            prescription.id,
            caller.id(),
            prescription.appointment_id
        );

        let content = format!(
            "Dr. {} has issued a prescription for you.",
            caller.profile().firstname
        );
        self.notifier.notify(
            &prescription.patient_id,
            content,
            NotificationKind::Prescription,
        )?;

        Ok(prescription.id)
    }

    /// Doctors get what they issued, joined with the patient; everyone else
    /// gets what was issued to them, joined with the doctor. Newest first,
    /// up to 100.
    ///
    /// # Errors
    /// Returns error if a query fails.
    pub fn list(&self, caller: &Caller) -> Result<Vec<PrescriptionDetails>> {
        if caller.is_doctor() {
            self.repos
                .prescriptions
                .by_doctor(caller.id(), LIST_LIMIT)?
                .into_iter()
                .map(|prescription| {
                    let patient = self.profile(&prescription.patient_id)?;
                    Ok(PrescriptionDetails {
                        prescription,
                        patient,
                        doctor: None,
                    })
                })
                .collect()
        } else {
            self.repos
                .prescriptions
                .by_patient(caller.id(), LIST_LIMIT)?
                .into_iter()
                .map(|prescription| {
                    let doctor = self.profile(&prescription.doctor_id)?;
                    Ok(PrescriptionDetails {
                        prescription,
                        patient: None,
                        doctor,
                    })
                })
                .collect()
        }
    }

    /// One prescription with both participants joined where they exist.
    /// Any authenticated caller may read any prescription.
    ///
    /// # Errors
    /// `NotFound` if there is no such prescription.
    pub fn get(&self, id: &str) -> Result<PrescriptionDetails> {
        let prescription = self
            .repos
            .prescriptions
            .find(id)?
            .ok_or_else(|| ServiceError::NotFound("Prescription not found".to_string()))?;

        Ok(PrescriptionDetails {
            patient: self.profile(&prescription.patient_id)?,
            doctor: self.profile(&prescription.doctor_id)?,
            prescription,
        })
    }

    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.repos.users.find(user_id)?.map(|user| user.profile))
    }
}
