//! Domain layer: Core business types and logic.
//!
//! Plain serde types for every stored document plus the pure pieces of
//! business logic (symptom triage, rating aggregation). Nothing here talks
//! to the store.

mod appointment;
mod doctor;
mod ids;
mod medical_record;
mod notification;
mod prescription;
mod review;
pub mod triage;
mod user;

pub use appointment::{Appointment, AppointmentDetails, AppointmentStatus};
pub use doctor::{fee_cutoff_text, DoctorApplication, DoctorFilter, DoctorListing, DoctorProfile, UserRef};
pub use ids::new_id;
pub use medical_record::MedicalRecord;
pub use notification::{Notification, NotificationKind};
pub use prescription::{Medication, Prescription, PrescriptionDetails};
pub use review::{RatingSummary, Review};
pub use triage::{triage, Severity, SymptomQuery, TriageReport};
pub use user::{ProfileChanges, User, UserProfile, UserStatus, DEFAULT_AVATAR};
