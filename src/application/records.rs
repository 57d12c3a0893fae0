//! Medical record service.

use serde::Deserialize;

use super::accounts::Caller;
use crate::domain::MedicalRecord;
use crate::ports::Repositories;
use crate::Result;

const LIST_LIMIT: usize = 100;

/// `POST /medicalrecord/create` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub patient_id: String,
    pub record_type: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
}

/// Service for medical records. Any authenticated user may write or read
/// any patient's records.
#[derive(Clone)]
pub struct RecordService {
    repos: Repositories,
}

impl RecordService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Returns the new record id.
    ///
    /// # Errors
    /// Returns error if the insert fails.
    pub fn create(&self, caller: &Caller, request: RecordRequest) -> Result<String> {
        let record = MedicalRecord::new(
            request.patient_id,
            request.record_type,
            request.title,
            request.description,
            request.attachments.unwrap_or_default(),
            caller.id(),
            caller.user.full_name(),
        );
        self.repos.records.insert(&record)?;

        tracing::info!("Medical record {} created by {}", record.id, caller.id());
        Ok(record.id)
    }

    /// Newest first, up to 100.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn for_patient(&self, patient_id: &str) -> Result<Vec<MedicalRecord>> {
        Ok(self.repos.records.for_patient(patient_id, LIST_LIMIT)?)
    }
}
