//! # DoctorOnCall
//!
//! Telemedicine booking backend.
//!
//! This crate provides:
//! - Account registration, login and signed session tokens
//! - A doctor credentialing workflow reviewed by admins
//! - Appointment booking, reviews, prescriptions and medical records
//! - A keyword-matched symptom triager
//! - Dashboard counts over appointments
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Stored documents and pure logic (triage, rating aggregation)
//! - `ports`: Repository and credential traits
//! - `adapters`: Concrete implementations (SQLite, Argon2/Ed25519, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `api`: HTTP surface (axum)
//! - `config`: Environment-driven server configuration

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

use ports::{CredentialError, StorageError};

/// Result type for DoctorOnCall operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for DoctorOnCall
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Credential operation failed: {0}")]
    Credential(CredentialError),
}

impl From<CredentialError> for ServiceError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Expired | CredentialError::InvalidToken => {
                ServiceError::Unauthenticated(e.to_string())
            }
            other => ServiceError::Credential(other),
        }
    }
}
