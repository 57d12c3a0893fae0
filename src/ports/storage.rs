//! Storage ports: one repository trait per document collection.
//!
//! Every method is a single store call and is atomic on its own. Nothing in
//! these traits spans calls, so multi-step workflows built on them have no
//! isolation from each other.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{
    Appointment, AppointmentStatus, DoctorFilter, DoctorProfile, MedicalRecord, Notification,
    Prescription, ProfileChanges, RatingSummary, Review, User, UserStatus,
};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// `users` collection.
pub trait UserRepository: Send + Sync {
    fn insert(&self, user: &User) -> StorageResult<()>;

    fn find(&self, id: &str) -> StorageResult<Option<User>>;

    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// All users in insertion order, up to `limit`.
    fn list(&self, limit: usize) -> StorageResult<Vec<User>>;

    /// Users with `isAdmin = true`, up to `limit`.
    fn list_admins(&self, limit: usize) -> StorageResult<Vec<User>>;

    /// Set only the fields present in `changes`.
    fn update_profile(&self, id: &str, changes: &ProfileChanges) -> StorageResult<()>;

    /// Set `status`, and `isDoctor` when given.
    fn set_credential_status(
        &self,
        id: &str,
        is_doctor: Option<bool>,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Returns whether a document was deleted.
    fn delete(&self, id: &str) -> StorageResult<bool>;

    fn count(&self) -> StorageResult<usize>;
}

/// `doctors` collection.
pub trait DoctorRepository: Send + Sync {
    fn insert(&self, doctor: &DoctorProfile) -> StorageResult<()>;

    fn find(&self, id: &str) -> StorageResult<Option<DoctorProfile>>;

    fn find_by_user(&self, user_id: &str) -> StorageResult<Option<DoctorProfile>>;

    /// Profiles matching `filter` in insertion order, up to `limit`.
    fn search(&self, filter: &DoctorFilter, limit: usize) -> StorageResult<Vec<DoctorProfile>>;

    /// Set the profile's `isDoctor` flag to true.
    fn mark_credentialed(&self, id: &str, now: DateTime<Utc>) -> StorageResult<()>;

    fn delete(&self, id: &str) -> StorageResult<bool>;

    fn delete_by_user(&self, user_id: &str) -> StorageResult<bool>;

    /// Atomically add one to `totalPatients` of the profile owned by
    /// `user_id`. No-op when there is no such profile.
    fn increment_patients(&self, user_id: &str) -> StorageResult<()>;

    /// Write `rating` and `totalReviews` onto the profile owned by `user_id`.
    fn set_rating(&self, user_id: &str, summary: &RatingSummary) -> StorageResult<()>;

    /// Replace the availability list of the profile owned by `user_id`.
    fn set_availability(
        &self,
        user_id: &str,
        availability: &[Value],
        now: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Profiles whose `isDoctor` flag equals `credentialed`.
    fn count(&self, credentialed: bool) -> StorageResult<usize>;
}

/// `appointments` collection.
pub trait AppointmentRepository: Send + Sync {
    fn insert(&self, appointment: &Appointment) -> StorageResult<()>;

    fn find(&self, id: &str) -> StorageResult<Option<Appointment>>;

    /// Newest first. With `participant`, only appointments where that user
    /// is the patient or the doctor.
    fn list(&self, participant: Option<&str>, limit: usize) -> StorageResult<Vec<Appointment>>;

    fn set_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StorageResult<()>;

    fn set_prescription(&self, id: &str, prescription_id: &str) -> StorageResult<()>;

    /// Delete every appointment the user takes part in; returns the count.
    fn delete_for_participant(&self, user_id: &str) -> StorageResult<usize>;

    /// All appointments, or only those with `status`.
    fn count(&self, status: Option<AppointmentStatus>) -> StorageResult<usize>;

    /// Appointments created in `[start, end)`.
    fn count_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<usize>;
}

/// `reviews` collection.
pub trait ReviewRepository: Send + Sync {
    fn insert(&self, review: &Review) -> StorageResult<()>;

    /// Reviews whose `doctorId` equals `doctor_id`, newest first.
    fn for_doctor(&self, doctor_id: &str, limit: usize) -> StorageResult<Vec<Review>>;
}

/// `prescriptions` collection.
pub trait PrescriptionRepository: Send + Sync {
    fn insert(&self, prescription: &Prescription) -> StorageResult<()>;

    fn find(&self, id: &str) -> StorageResult<Option<Prescription>>;

    /// Issued by `doctor_id`, newest first.
    fn by_doctor(&self, doctor_id: &str, limit: usize) -> StorageResult<Vec<Prescription>>;

    /// Issued to `patient_id`, newest first.
    fn by_patient(&self, patient_id: &str, limit: usize) -> StorageResult<Vec<Prescription>>;
}

/// `medicalrecords` collection.
pub trait MedicalRecordRepository: Send + Sync {
    fn insert(&self, record: &MedicalRecord) -> StorageResult<()>;

    /// Records of `patient_id`, newest first.
    fn for_patient(&self, patient_id: &str, limit: usize) -> StorageResult<Vec<MedicalRecord>>;
}

/// `notifications` collection.
pub trait NotificationRepository: Send + Sync {
    fn insert(&self, notification: &Notification) -> StorageResult<()>;

    /// Notifications addressed to `user_id`, newest first.
    fn for_user(&self, user_id: &str, limit: usize) -> StorageResult<Vec<Notification>>;

    /// Returns the number deleted.
    fn delete_for_user(&self, user_id: &str) -> StorageResult<usize>;
}

/// The full set of collections, injected into every service.
///
/// Each field can be swapped independently, e.g. to wrap one collection in
/// a test double.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub doctors: Arc<dyn DoctorRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub prescriptions: Arc<dyn PrescriptionRepository>,
    pub records: Arc<dyn MedicalRecordRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    /// Serve every collection from one store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + DoctorRepository
            + AppointmentRepository
            + ReviewRepository
            + PrescriptionRepository
            + MedicalRecordRepository
            + NotificationRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            doctors: store.clone(),
            appointments: store.clone(),
            reviews: store.clone(),
            prescriptions: store.clone(),
            records: store.clone(),
            notifications: store,
        }
    }
}
