//! SQLite adapter: document-store implementation of the repository ports.
//!
//! Each collection is a table of JSON documents:
//!
//! ```sql
//! (id TEXT PRIMARY KEY, created_at INTEGER NOT NULL, doc TEXT NOT NULL)
//! ```
//!
//! Filters go through `json_extract`, partial updates through `json_patch`
//! and counters through a single `json_set` UPDATE, so every repository
//! method is exactly one statement. `created_at` mirrors the document's
//! `createdAt` in microseconds for ordering and range counts.
//!
//! Like a document store's `update_one`/`delete_one`, single-document
//! writes touch only the first match in insertion order.
//!
//! # Mutex Behavior
//!
//! The connection sits behind a `Mutex`, which makes each call atomic and
//! nothing more. A poisoned lock surfaces as `StorageError::LockPoisoned`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Params};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::{
    Appointment, AppointmentStatus, DoctorFilter, DoctorProfile, MedicalRecord, Notification,
    Prescription, ProfileChanges, RatingSummary, Review, User, UserStatus,
};
use crate::ports::{
    AppointmentRepository, DoctorRepository, MedicalRecordRepository, NotificationRepository,
    PrescriptionRepository, ReviewRepository, StorageError, StorageResult, UserRepository,
};

const USERS: &str = "users";
const DOCTORS: &str = "doctors";
const APPOINTMENTS: &str = "appointments";
const REVIEWS: &str = "reviews";
const PRESCRIPTIONS: &str = "prescriptions";
const MEDICAL_RECORDS: &str = "medicalrecords";
const NOTIFICATIONS: &str = "notifications";

const COLLECTIONS: [&str; 7] = [
    USERS,
    DOCTORS,
    APPOINTMENTS,
    REVIEWS,
    PRESCRIPTIONS,
    MEDICAL_RECORDS,
    NOTIFICATIONS,
];

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(Box::new(e))
    }
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) a database file.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        for table in COLLECTIONS {
            conn.execute_batch(&format!(
                r"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    created_at INTEGER NOT NULL,
                    doc TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_{table}_created
                    ON {table}(created_at DESC);
                ",
            ))?;
        }

        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn insert_doc<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        created_at: DateTime<Utc>,
        doc: &T,
    ) -> StorageResult<()> {
        let body = serde_json::to_string(doc)?;
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO {table} (id, created_at, doc) VALUES (?1, ?2, ?3)"),
            params![id, created_at.timestamp_micros(), body],
        )?;

        tracing::debug!("Inserted document {} into {}", id, table);
        Ok(())
    }

    fn fetch_all<T, P>(&self, sql: &str, params: P) -> StorageResult<Vec<T>>
    where
        T: DeserializeOwned,
        P: Params,
    {
        let bodies = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params, |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StorageError::from))
            .collect()
    }

    fn fetch_one<T, P>(&self, sql: &str, params: P) -> StorageResult<Option<T>>
    where
        T: DeserializeOwned,
        P: Params,
    {
        Ok(self.fetch_all(sql, params)?.into_iter().next())
    }

    fn execute<P: Params>(&self, sql: &str, params: P) -> StorageResult<usize> {
        let conn = self.conn()?;
        Ok(conn.execute(sql, params)?)
    }

    fn count_where<P: Params>(&self, sql: &str, params: P) -> StorageResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Merge `patch` into the first document where `key_expr = key`.
    fn patch_first(&self, table: &str, key_expr: &str, key: &str, patch: &Value) -> StorageResult<()> {
        let body = serde_json::to_string(patch)?;
        let changed = self.execute(
            &format!(
                "UPDATE {table} SET doc = json_patch(doc, ?1)
                 WHERE rowid = (SELECT rowid FROM {table} WHERE {key_expr} = ?2 ORDER BY rowid LIMIT 1)"
            ),
            params![body, key],
        )?;

        tracing::debug!("Patched {} document(s) in {}", changed, table);
        Ok(())
    }

    fn delete_first(&self, table: &str, key_expr: &str, key: &str) -> StorageResult<bool> {
        let deleted = self.execute(
            &format!(
                "DELETE FROM {table}
                 WHERE rowid = (SELECT rowid FROM {table} WHERE {key_expr} = ?1 ORDER BY rowid LIMIT 1)"
            ),
            params![key],
        )?;
        Ok(deleted > 0)
    }
}

fn by_field(field: &str) -> String {
    format!("json_extract(doc, '$.{field}')")
}

impl UserRepository for SqliteStorage {
    fn insert(&self, user: &User) -> StorageResult<()> {
        self.insert_doc(USERS, &user.profile.id, user.profile.created_at, user)
    }

    fn find(&self, id: &str) -> StorageResult<Option<User>> {
        self.fetch_one("SELECT doc FROM users WHERE id = ?1", params![id])
    }

    fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.fetch_one(
            "SELECT doc FROM users WHERE json_extract(doc, '$.email') = ?1 ORDER BY rowid LIMIT 1",
            params![email],
        )
    }

    fn list(&self, limit: usize) -> StorageResult<Vec<User>> {
        self.fetch_all(
            "SELECT doc FROM users ORDER BY rowid LIMIT ?1",
            params![limit as i64],
        )
    }

    fn list_admins(&self, limit: usize) -> StorageResult<Vec<User>> {
        self.fetch_all(
            "SELECT doc FROM users WHERE json_extract(doc, '$.isAdmin') = 1 ORDER BY rowid LIMIT ?1",
            params![limit as i64],
        )
    }

    fn update_profile(&self, id: &str, changes: &ProfileChanges) -> StorageResult<()> {
        let patch = serde_json::to_value(changes)?;
        self.patch_first(USERS, "id", id, &patch)
    }

    fn set_credential_status(
        &self,
        id: &str,
        is_doctor: Option<bool>,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        let mut patch = json!({ "status": status, "updatedAt": now });
        if let Some(flag) = is_doctor {
            patch["isDoctor"] = Value::Bool(flag);
        }
        self.patch_first(USERS, "id", id, &patch)
    }

    fn delete(&self, id: &str) -> StorageResult<bool> {
        self.delete_first(USERS, "id", id)
    }

    fn count(&self) -> StorageResult<usize> {
        self.count_where("SELECT COUNT(*) FROM users", [])
    }
}

impl DoctorRepository for SqliteStorage {
    fn insert(&self, doctor: &DoctorProfile) -> StorageResult<()> {
        self.insert_doc(DOCTORS, &doctor.id, doctor.created_at, doctor)
    }

    fn find(&self, id: &str) -> StorageResult<Option<DoctorProfile>> {
        self.fetch_one("SELECT doc FROM doctors WHERE id = ?1", params![id])
    }

    fn find_by_user(&self, user_id: &str) -> StorageResult<Option<DoctorProfile>> {
        self.fetch_one(
            "SELECT doc FROM doctors WHERE json_extract(doc, '$.userId') = ?1 ORDER BY rowid LIMIT 1",
            params![user_id],
        )
    }

    fn search(&self, filter: &DoctorFilter, limit: usize) -> StorageResult<Vec<DoctorProfile>> {
        let mut values: Vec<SqlValue> = vec![SqlValue::Integer(i64::from(filter.credentialed))];
        let mut clauses = vec!["json_extract(doc, '$.isDoctor') = ?1".to_string()];

        if let Some(specialization) = &filter.specialization {
            values.push(SqlValue::Text(specialization.clone()));
            clauses.push(format!(
                "instr(lower(json_extract(doc, '$.specialization')), lower(?{})) > 0",
                values.len()
            ));
        }
        if let Some(min_rating) = filter.min_rating {
            values.push(SqlValue::Real(min_rating));
            clauses.push(format!("json_extract(doc, '$.rating') >= ?{}", values.len()));
        }
        if let Some(max_fees) = &filter.max_fees {
            values.push(SqlValue::Text(max_fees.clone()));
            clauses.push(format!(
                "(json_type(doc, '$.fees') = 'text' AND json_extract(doc, '$.fees') <= ?{})",
                values.len()
            ));
        }

        values.push(SqlValue::Integer(limit as i64));
        let sql = format!(
            "SELECT doc FROM doctors WHERE {} ORDER BY rowid LIMIT ?{}",
            clauses.join(" AND "),
            values.len()
        );

        self.fetch_all(&sql, params_from_iter(values))
    }

    fn mark_credentialed(&self, id: &str, now: DateTime<Utc>) -> StorageResult<()> {
        self.patch_first(DOCTORS, "id", id, &json!({ "isDoctor": true, "updatedAt": now }))
    }

    fn delete(&self, id: &str) -> StorageResult<bool> {
        self.delete_first(DOCTORS, "id", id)
    }

    fn delete_by_user(&self, user_id: &str) -> StorageResult<bool> {
        self.delete_first(DOCTORS, &by_field("userId"), user_id)
    }

    fn increment_patients(&self, user_id: &str) -> StorageResult<()> {
        self.execute(
            "UPDATE doctors
             SET doc = json_set(doc, '$.totalPatients',
                                coalesce(json_extract(doc, '$.totalPatients'), 0) + 1)
             WHERE rowid = (SELECT rowid FROM doctors
                            WHERE json_extract(doc, '$.userId') = ?1 ORDER BY rowid LIMIT 1)",
            params![user_id],
        )?;
        Ok(())
    }

    fn set_rating(&self, user_id: &str, summary: &RatingSummary) -> StorageResult<()> {
        self.patch_first(
            DOCTORS,
            &by_field("userId"),
            user_id,
            &json!({ "rating": summary.rating, "totalReviews": summary.total_reviews }),
        )
    }

    fn set_availability(
        &self,
        user_id: &str,
        availability: &[Value],
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.patch_first(
            DOCTORS,
            &by_field("userId"),
            user_id,
            &json!({ "availability": availability, "updatedAt": now }),
        )
    }

    fn count(&self, credentialed: bool) -> StorageResult<usize> {
        self.count_where(
            "SELECT COUNT(*) FROM doctors WHERE json_extract(doc, '$.isDoctor') = ?1",
            params![credentialed],
        )
    }
}

impl AppointmentRepository for SqliteStorage {
    fn insert(&self, appointment: &Appointment) -> StorageResult<()> {
        self.insert_doc(APPOINTMENTS, &appointment.id, appointment.created_at, appointment)
    }

    fn find(&self, id: &str) -> StorageResult<Option<Appointment>> {
        self.fetch_one("SELECT doc FROM appointments WHERE id = ?1", params![id])
    }

    fn list(&self, participant: Option<&str>, limit: usize) -> StorageResult<Vec<Appointment>> {
        match participant {
            Some(user_id) => self.fetch_all(
                "SELECT doc FROM appointments
                 WHERE json_extract(doc, '$.userId') = ?1 OR json_extract(doc, '$.doctorId') = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                params![user_id, limit as i64],
            ),
            None => self.fetch_all(
                "SELECT doc FROM appointments ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                params![limit as i64],
            ),
        }
    }

    fn set_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.patch_first(APPOINTMENTS, "id", id, &json!({ "status": status, "updatedAt": now }))
    }

    fn set_prescription(&self, id: &str, prescription_id: &str) -> StorageResult<()> {
        self.patch_first(APPOINTMENTS, "id", id, &json!({ "prescription": prescription_id }))
    }

    fn delete_for_participant(&self, user_id: &str) -> StorageResult<usize> {
        self.execute(
            "DELETE FROM appointments
             WHERE json_extract(doc, '$.userId') = ?1 OR json_extract(doc, '$.doctorId') = ?1",
            params![user_id],
        )
    }

    fn count(&self, status: Option<AppointmentStatus>) -> StorageResult<usize> {
        match status {
            Some(status) => self.count_where(
                "SELECT COUNT(*) FROM appointments WHERE json_extract(doc, '$.status') = ?1",
                params![status.as_str()],
            ),
            None => self.count_where("SELECT COUNT(*) FROM appointments", []),
        }
    }

    fn count_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<usize> {
        self.count_where(
            "SELECT COUNT(*) FROM appointments WHERE created_at >= ?1 AND created_at < ?2",
            params![start.timestamp_micros(), end.timestamp_micros()],
        )
    }
}

impl ReviewRepository for SqliteStorage {
    fn insert(&self, review: &Review) -> StorageResult<()> {
        self.insert_doc(REVIEWS, &review.id, review.created_at, review)
    }

    fn for_doctor(&self, doctor_id: &str, limit: usize) -> StorageResult<Vec<Review>> {
        self.fetch_all(
            "SELECT doc FROM reviews WHERE json_extract(doc, '$.doctorId') = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            params![doctor_id, limit as i64],
        )
    }
}

impl PrescriptionRepository for SqliteStorage {
    fn insert(&self, prescription: &Prescription) -> StorageResult<()> {
        self.insert_doc(PRESCRIPTIONS, &prescription.id, prescription.created_at, prescription)
    }

    fn find(&self, id: &str) -> StorageResult<Option<Prescription>> {
        self.fetch_one("SELECT doc FROM prescriptions WHERE id = ?1", params![id])
    }

    fn by_doctor(&self, doctor_id: &str, limit: usize) -> StorageResult<Vec<Prescription>> {
        self.fetch_all(
            "SELECT doc FROM prescriptions WHERE json_extract(doc, '$.doctorId') = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            params![doctor_id, limit as i64],
        )
    }

    fn by_patient(&self, patient_id: &str, limit: usize) -> StorageResult<Vec<Prescription>> {
        self.fetch_all(
            "SELECT doc FROM prescriptions WHERE json_extract(doc, '$.patientId') = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            params![patient_id, limit as i64],
        )
    }
}

impl MedicalRecordRepository for SqliteStorage {
    fn insert(&self, record: &MedicalRecord) -> StorageResult<()> {
        self.insert_doc(MEDICAL_RECORDS, &record.id, record.created_at, record)
    }

    fn for_patient(&self, patient_id: &str, limit: usize) -> StorageResult<Vec<MedicalRecord>> {
        self.fetch_all(
            "SELECT doc FROM medicalrecords WHERE json_extract(doc, '$.patientId') = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            params![patient_id, limit as i64],
        )
    }
}

impl NotificationRepository for SqliteStorage {
    fn insert(&self, notification: &Notification) -> StorageResult<()> {
        self.insert_doc(NOTIFICATIONS, &notification.id, notification.created_at, notification)
    }

    fn for_user(&self, user_id: &str, limit: usize) -> StorageResult<Vec<Notification>> {
        self.fetch_all(
            "SELECT doc FROM notifications WHERE json_extract(doc, '$.userId') = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            params![user_id, limit as i64],
        )
    }

    fn delete_for_user(&self, user_id: &str) -> StorageResult<usize> {
        self.execute(
            "DELETE FROM notifications WHERE json_extract(doc, '$.userId') = ?1",
            params![user_id],
        )
    }
}
