//! Appointment lifecycle: booking, completion, cancellation and listing.
//!
//! Status changes are blind writes. Nothing checks the current status, so a
//! cancelled appointment can still be completed and vice versa.

use chrono::Utc;
use serde::Deserialize;

use super::accounts::{Caller, LIST_LIMIT};
use super::notifications::NotificationService;
use crate::domain::{Appointment, AppointmentDetails, AppointmentStatus, NotificationKind, UserProfile};
use crate::ports::Repositories;
use crate::{Result, ServiceError};

const DEFAULT_APPOINTMENT_TYPE: &str = "consultation";

/// `POST /appointment/bookappointment` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    /// The doctor's user id
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    /// Display name sent by clients; required but not stored.
    pub doctorname: String,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub appointment_type: Option<String>,
}

/// Body of `PUT /appointment/completed`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionRequest {
    pub appointid: Option<String>,
}

/// Service for appointments.
#[derive(Clone)]
pub struct AppointmentService {
    repos: Repositories,
    notifier: NotificationService,
}

impl AppointmentService {
    pub fn new(repos: Repositories, notifier: NotificationService) -> Self {
        Self { repos, notifier }
    }

    /// Book an appointment for the caller, count the patient on the
    /// doctor's profile and notify the doctor. Returns the appointment id.
    ///
    /// The doctor id is not checked; an unknown doctor still gets an
    /// appointment and a notification.
    ///
    /// # Errors
    /// Returns error if a store call fails.
    pub fn book(&self, caller: &Caller, request: BookingRequest) -> Result<String> {
        let appointment = Appointment::new(
            caller.id(),
            request.doctor_id,
            request.date,
            request.time,
            request.symptoms,
            request
                .appointment_type
                .unwrap_or_else(|| DEFAULT_APPOINTMENT_TYPE.to_string()),
        );
        self.repos.appointments.insert(&appointment)?;
        self.repos.doctors.increment_patients(&appointment.doctor_id)?;
        tracing::info!("Appointment {} booked by {}", appointment.id, caller.id());

        let content = format!(
            "{} booked an appointment for {} at {}.",
            caller.user.full_name(),
            appointment.date,
            appointment.time
        );
        self.notifier
            .notify(&appointment.doctor_id, content, NotificationKind::Appointment)?;

        Ok(appointment.id)
    }

    /// Mark an appointment completed and, if it exists, ask the patient for
    /// a review. Any authenticated caller may do this.
    ///
    /// # Errors
    /// `Validation` without an appointment id.
    pub fn complete(&self, caller: &Caller, request: &CompletionRequest) -> Result<()> {
        let id = request
            .appointid
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::Validation("Appointment ID required".to_string()))?;

        self.repos
            .appointments
            .set_status(id, AppointmentStatus::Completed, Utc::now())?;

        if let Some(appointment) = self.repos.appointments.find(id)? {
            tracing::info!("Appointment {} completed by {}", id, caller.id());
            let content = format!(
                "Your appointment with Dr. {} has been completed. Please leave a review!",
                caller.user.full_name()
            );
            self.notifier
                .notify(&appointment.user_id, content, NotificationKind::Completed)?;
        }
        Ok(())
    }

    /// Cancel an appointment the caller takes part in and notify the other
    /// party.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Forbidden` for outsiders.
    pub fn cancel(&self, caller: &Caller, id: &str) -> Result<()> {
        let appointment = self
            .repos
            .appointments
            .find(id)?
            .ok_or_else(|| ServiceError::NotFound("Appointment not found".to_string()))?;

        if !appointment.involves(caller.id()) {
            tracing::warn!("Cancellation of {} refused for {}", id, caller.id());
            return Err(ServiceError::Forbidden("Not authorized".to_string()));
        }

        self.repos
            .appointments
            .set_status(id, AppointmentStatus::Cancelled, Utc::now())?;
        tracing::info!("Appointment {} cancelled by {}", id, caller.id());

        let content = format!(
            "Appointment on {} at {} has been cancelled.",
            appointment.date, appointment.time
        );
        self.notifier.notify(
            appointment.counterpart_of(caller.id()),
            content,
            NotificationKind::Cancelled,
        )
    }

    /// Newest first, up to 1000, with patient and doctor joined. With
    /// `participant`, only that user's appointments.
    ///
    /// # Errors
    /// Returns error if a query fails.
    pub fn list(&self, participant: Option<&str>) -> Result<Vec<AppointmentDetails>> {
        let participant = participant.filter(|p| !p.is_empty());
        let appointments = self.repos.appointments.list(participant, LIST_LIMIT)?;

        appointments
            .into_iter()
            .map(|appointment| {
                let patient = self.profile(&appointment.user_id)?;
                let doctor = self.profile(&appointment.doctor_id)?;
                Ok(AppointmentDetails::new(appointment, patient, doctor))
            })
            .collect()
    }

    fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.repos.users.find(user_id)?.map(|user| user.profile))
    }
}
