//! Patient medical records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::new_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub patient_id: String,
    pub record_type: String,
    pub title: String,
    pub description: String,
    /// Attachment references (URLs or storage keys)
    pub attachments: Vec<String>,
    pub created_by: String,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicalRecord {
    #[must_use]
    pub fn new(
        patient_id: impl Into<String>,
        record_type: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        attachments: Vec<String>,
        created_by: impl Into<String>,
        created_by_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            patient_id: patient_id.into(),
            record_type: record_type.into(),
            title: title.into(),
            description: description.into(),
            attachments,
            created_by: created_by.into(),
            created_by_name: created_by_name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
