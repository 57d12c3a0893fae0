//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the booking logic and the document store and credential backend.

mod credentials;
mod storage;

pub use credentials::{CredentialError, CredentialStore, TokenClaims};
pub use storage::{
    AppointmentRepository, DoctorRepository, MedicalRecordRepository, NotificationRepository,
    PrescriptionRepository, Repositories, ReviewRepository, StorageError, StorageResult,
    UserRepository,
};
