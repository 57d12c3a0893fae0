//! Account service: registration, login, session resolution, profile
//! maintenance and cascading user deletion.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::domain::{ProfileChanges, User, UserProfile};
use crate::ports::{CredentialStore, Repositories, TokenClaims};
use crate::{Result, ServiceError};

pub(crate) const LIST_LIMIT: usize = 1000;

/// `POST /user/register` body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub pic: Option<String>,
}

/// `POST /user/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `PUT /user/updateprofile` body. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub age: Option<String>,
    pub mobile: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub emergency_contact: Option<String>,
}

/// The authenticated user behind a request.
///
/// `user` is re-read from the store on every request; `claims` is what the
/// token said at login. The two can disagree after a role change.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
    pub claims: TokenClaims,
}

impl Caller {
    #[must_use]
    pub fn id(&self) -> &str {
        self.user.id()
    }

    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.user.profile
    }

    /// Doctor role as currently stored on the user.
    #[must_use]
    pub fn is_doctor(&self) -> bool {
        self.user.profile.is_doctor
    }

    /// Admin gate. Trusts the token's `isAdmin` claim.
    ///
    /// # Errors
    /// `Forbidden` unless the token was issued to an admin.
    pub fn require_admin(&self) -> Result<()> {
        if self.claims.is_admin {
            Ok(())
        } else {
            tracing::warn!("Admin-only operation refused for {}", self.id());
            Err(ServiceError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Plausibility check only: one `@`, a non-empty local part, a dotted domain.
fn validate_email(email: &str) -> Result<()> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain.split('.').count() >= 2
            && domain.split('.').all(|label| !label.is_empty())
    });

    if valid {
        Ok(())
    } else {
        Err(ServiceError::Validation("Invalid email address".to_string()))
    }
}

/// Service for accounts and sessions.
#[derive(Clone)]
pub struct AccountService {
    repos: Repositories,
    credentials: Arc<dyn CredentialStore>,
}

impl AccountService {
    pub fn new(repos: Repositories, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { repos, credentials }
    }

    /// Create a user with default profile fields.
    ///
    /// The duplicate check and the insert are separate store calls, so two
    /// concurrent registrations for one email can both succeed.
    ///
    /// # Errors
    /// `DuplicateEmail` if the email is already taken.
    pub fn register(&self, request: RegisterRequest) -> Result<UserProfile> {
        validate_email(&request.email)?;

        if self.repos.users.find_by_email(&request.email)?.is_some() {
            return Err(ServiceError::DuplicateEmail);
        }

        let digest = self.credentials.hash_password(&request.password)?;
        let user = User::new(
            request.firstname,
            request.lastname,
            request.email,
            digest,
            request.pic,
        );
        self.repos.users.insert(&user)?;

        tracing::info!("Registered user {}", user.id());
        Ok(user.profile)
    }

    /// Exchange email and password for a session token.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown email or a wrong password.
    pub fn login(&self, request: LoginRequest) -> Result<String> {
        let Some(user) = self.repos.users.find_by_email(&request.email)? else {
            tracing::warn!("Login refused: unknown account");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self
            .credentials
            .verify_password(&request.password, &user.password_digest)
        {
            tracing::warn!("Login refused for {}", user.id());
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.credentials.issue_token(
            user.id(),
            user.profile.is_admin,
            user.profile.is_doctor,
        )?;
        tracing::info!("Issued session token for {}", user.id());
        Ok(token)
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    /// `Unauthenticated` for a bad or expired token, `NotFound` when the
    /// token's user no longer exists.
    pub fn authenticate(&self, token: &str) -> Result<Caller> {
        let claims = self.credentials.verify_token(token).map_err(|e| {
            tracing::warn!("Rejected session token: {}", e);
            ServiceError::from(e)
        })?;

        let user = self
            .repos
            .users
            .find(&claims.user_id)?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        Ok(Caller { user, claims })
    }

    /// # Errors
    /// `NotFound` if there is no such user.
    pub fn get_user(&self, id: &str) -> Result<UserProfile> {
        self.repos
            .users
            .find(id)?
            .map(|user| user.profile)
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    /// Every user in insertion order, up to 1000.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn list_users(&self) -> Result<Vec<UserProfile>> {
        Ok(self
            .repos
            .users
            .list(LIST_LIMIT)?
            .into_iter()
            .map(|user| user.profile)
            .collect())
    }

    /// Set the supplied fields on the caller's profile and return the result.
    ///
    /// A non-empty password is re-hashed; an empty one is ignored. The new
    /// email is not checked against other accounts.
    ///
    /// # Errors
    /// `Validation` for a malformed email, `NotFound` if the user vanished
    /// before the re-read.
    pub fn update_profile(&self, caller: &Caller, update: ProfileUpdate) -> Result<UserProfile> {
        if let Some(email) = &update.email {
            validate_email(email)?;
        }

        let password_digest = match update.password.as_deref() {
            Some(password) if !password.is_empty() => {
                Some(self.credentials.hash_password(password)?)
            }
            _ => None,
        };

        let changes = ProfileChanges {
            firstname: update.firstname,
            lastname: update.lastname,
            email: update.email,
            age: update.age,
            mobile: update.mobile,
            gender: update.gender,
            address: update.address,
            blood_group: update.blood_group,
            allergies: update.allergies,
            emergency_contact: update.emergency_contact,
            password_digest,
            updated_at: Utc::now(),
        };
        self.repos.users.update_profile(caller.id(), &changes)?;

        tracing::info!("Updated profile of {}", caller.id());
        self.get_user(caller.id())
    }

    /// Admin-only. Delete a user, then their doctor profile, appointments and
    /// inbox, one store call at a time.
    ///
    /// Nothing is rolled back if a later step fails. Reviews, prescriptions
    /// and medical records that mention the user are left in place.
    ///
    /// # Errors
    /// `Forbidden` for non-admins, `Validation` without a user id,
    /// `NotFound` if no user was deleted.
    pub fn delete_user(&self, caller: &Caller, user_id: Option<&str>) -> Result<()> {
        caller.require_admin()?;

        let user_id = user_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::Validation("User ID required".to_string()))?;

        if !self.repos.users.delete(user_id)? {
            return Err(ServiceError::NotFound("User not found".to_string()));
        }
        tracing::warn!("Admin {} deleted user {}", caller.id(), user_id);

        self.repos.doctors.delete_by_user(user_id)?;
        let appointments = self.repos.appointments.delete_for_participant(user_id)?;
        let notifications = self.repos.notifications.delete_for_user(user_id)?;

        tracing::info!(
            "Cascade for {}: {} appointment(s), {} notification(s) removed",
            user_id,
            appointments,
            notifications
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use super::*;
    use crate::adapters::SqliteStorage;
    use crate::application::testing::{fixture, fixture_with, Fixture};
    use crate::domain::{
        Appointment, DoctorApplication, DoctorProfile, MedicalRecord, NotificationKind,
        Prescription, Review,
    };
    use crate::ports::{StorageResult, UserRepository};

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: email.into(),
            password: "analytical".into(),
            pic: None,
        }
    }

    #[test]
    fn test_register_then_login() {
        let fx = fixture();
        let profile = fx
            .services
            .accounts
            .register(register_request("ada@example.com"))
            .expect("Should register");
        assert_eq!(profile.gender.as_deref(), Some("neither"));

        let token = fx
            .services
            .accounts
            .login(LoginRequest {
                email: "ada@example.com".into(),
                password: "analytical".into(),
            })
            .expect("Should log in");

        let caller = fx.services.accounts.authenticate(&token).expect("Should authenticate");
        assert_eq!(caller.id(), profile.id);
        assert!(!caller.claims.is_admin);
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let fx = fixture();
        fx.register("Ada", "Lovelace", "ada@example.com");

        let err = fx
            .services
            .accounts
            .register(register_request("ada@example.com"))
            .expect_err("Second registration should fail");
        assert!(matches!(err, ServiceError::DuplicateEmail));
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let fx = fixture();
        for email in ["plain", "@example.com", "ada@", "ada@localhost", "a@b@c.com"] {
            let err = fx
                .services
                .accounts
                .register(register_request(email))
                .expect_err("Should reject malformed email");
            assert!(matches!(err, ServiceError::Validation(_)), "{email}");
        }
    }

    #[test]
    fn test_login_failures_share_one_message() {
        let fx = fixture();
        fx.register("Ada", "Lovelace", "ada@example.com");

        for (email, password) in [("ada@example.com", "wrong"), ("nobody@example.com", "password")] {
            let err = fx
                .services
                .accounts
                .login(LoginRequest {
                    email: email.into(),
                    password: password.into(),
                })
                .expect_err("Should refuse");
            assert!(matches!(err, ServiceError::InvalidCredentials));
            assert_eq!(err.to_string(), "Invalid email or password");
        }
    }

    #[test]
    fn test_authenticate_deleted_user_is_not_found() {
        let fx = fixture();
        let user = fx.register("Ada", "Lovelace", "ada@example.com");
        let token = fx
            .credentials
            .issue_token(user.id(), false, false)
            .expect("Should issue");
        fx.repos.users.delete(user.id()).expect("Should delete");

        let err = fx.services.accounts.authenticate(&token).expect_err("Should fail");
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "User not found"));
    }

    #[test]
    fn test_authenticate_rejects_bad_tokens() {
        let fx = fixture();
        let err = fx.services.accounts.authenticate("nonsense").expect_err("Should fail");
        assert!(matches!(err, ServiceError::Unauthenticated(ref m) if m == "Invalid token"));
    }

    #[test]
    fn test_admin_gate_trusts_token_claim() {
        let fx = fixture();
        let user = fx.register("Ada", "Lovelace", "ada@example.com");

        // Stored flag says admin, token says not: refused.
        let mut stored = user.clone();
        stored.profile.is_admin = true;
        let caller = fx.caller_with_claims(&stored, false);
        assert!(matches!(caller.require_admin(), Err(ServiceError::Forbidden(_))));

        // Token says admin, stored flag says not: allowed.
        let caller = fx.caller_with_claims(&user, true);
        assert!(caller.require_admin().is_ok());
    }

    #[test]
    fn test_update_profile_sets_only_supplied_fields() {
        let fx = fixture();
        let user = fx.register("Ada", "Lovelace", "ada@example.com");
        let caller = fx.caller(&user);

        let updated = fx
            .services
            .accounts
            .update_profile(
                &caller,
                ProfileUpdate {
                    age: Some("36".into()),
                    blood_group: Some("AB-".into()),
                    password: Some(String::new()),
                    ..ProfileUpdate::default()
                },
            )
            .expect("Should update");

        assert_eq!(updated.age.as_deref(), Some("36"));
        assert_eq!(updated.blood_group.as_deref(), Some("AB-"));
        assert_eq!(updated.firstname, "Ada");
        assert!(updated.updated_at >= user.profile.updated_at);

        // Empty password left the old one in place.
        fx.services
            .accounts
            .login(LoginRequest {
                email: "ada@example.com".into(),
                password: Fixture::PASSWORD.into(),
            })
            .expect("Old password should still work");
    }

    #[test]
    fn test_update_profile_rehashes_password() {
        let fx = fixture();
        let user = fx.register("Ada", "Lovelace", "ada@example.com");
        let caller = fx.caller(&user);

        fx.services
            .accounts
            .update_profile(
                &caller,
                ProfileUpdate {
                    password: Some("new-secret".into()),
                    ..ProfileUpdate::default()
                },
            )
            .expect("Should update");

        let stored = fx.repos.users.find(user.id()).expect("Should find").expect("Should exist");
        assert!(stored.password_digest.starts_with("$argon2id$"));

        let login = |password: &str| {
            fx.services.accounts.login(LoginRequest {
                email: "ada@example.com".into(),
                password: password.into(),
            })
        };
        assert!(login("new-secret").is_ok());
        assert!(login(Fixture::PASSWORD).is_err());
    }

    #[test]
    fn test_delete_user_requires_admin_and_id() {
        let fx = fixture();
        let user = fx.register("Ada", "Lovelace", "ada@example.com");
        let caller = fx.caller(&user);
        let admin = fx.admin();

        assert!(matches!(
            fx.services.accounts.delete_user(&caller, Some(user.id())),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            fx.services.accounts.delete_user(&admin, None),
            Err(ServiceError::Validation(ref m)) if m == "User ID required"
        ));
        assert!(matches!(
            fx.services.accounts.delete_user(&admin, Some("missing")),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_cascading_delete_leaves_clinical_history() {
        let fx = fixture();
        let admin = fx.admin();
        let victim = fx.register("Gone", "Soon", "gone@example.com");
        let other = fx.register("Stays", "Here", "stays@example.com");

        fx.repos
            .doctors
            .insert(&DoctorProfile::from_application(victim.id(), DoctorApplication::default()))
            .expect("Should insert");
        for appt in [
            Appointment::new(victim.id(), other.id(), "d", "t", None, "consultation"),
            Appointment::new(other.id(), victim.id(), "d", "t", None, "consultation"),
            Appointment::new(other.id(), "someone-else", "d", "t", None, "consultation"),
        ] {
            fx.repos.appointments.insert(&appt).expect("Should insert");
        }
        fx.services
            .notifications
            .notify(victim.id(), "bye", NotificationKind::Success)
            .expect("Should notify");
        fx.repos
            .reviews
            .insert(&Review::new(victim.id(), "Gone Soon", "", other.id(), 5, "great", None))
            .expect("Should insert");
        fx.repos
            .prescriptions
            .insert(&Prescription::new("a", other.id(), "Dr. Stays Here", victim.id(), "flu", vec![], "rest", None))
            .expect("Should insert");
        fx.repos
            .records
            .insert(&MedicalRecord::new(victim.id(), "lab", "CBC", "ok", vec![], other.id(), "Stays Here"))
            .expect("Should insert");

        fx.services
            .accounts
            .delete_user(&admin, Some(victim.id()))
            .expect("Should delete");

        assert!(fx.repos.users.find(victim.id()).expect("Should query").is_none());
        assert!(fx.repos.doctors.find_by_user(victim.id()).expect("Should query").is_none());
        assert_eq!(fx.repos.appointments.count(None).expect("Should count"), 1);
        assert!(fx.services.notifications.list(victim.id()).expect("Should list").is_empty());

        assert_eq!(fx.repos.reviews.for_doctor(other.id(), 100).expect("Should list").len(), 1);
        assert_eq!(fx.repos.prescriptions.by_patient(victim.id(), 100).expect("Should list").len(), 1);
        assert_eq!(fx.repos.records.for_patient(victim.id(), 100).expect("Should list").len(), 1);
    }

    /// Holds every email lookup until two lookups have happened.
    struct RendezvousUsers {
        inner: Arc<SqliteStorage>,
        barrier: Barrier,
    }

    impl UserRepository for RendezvousUsers {
        fn insert(&self, user: &User) -> StorageResult<()> {
            UserRepository::insert(self.inner.as_ref(), user)
        }
        fn find(&self, id: &str) -> StorageResult<Option<User>> {
            UserRepository::find(self.inner.as_ref(), id)
        }
        fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
            let found = self.inner.find_by_email(email);
            self.barrier.wait();
            found
        }
        fn list(&self, limit: usize) -> StorageResult<Vec<User>> {
            UserRepository::list(self.inner.as_ref(), limit)
        }
        fn list_admins(&self, limit: usize) -> StorageResult<Vec<User>> {
            self.inner.list_admins(limit)
        }
        fn update_profile(&self, id: &str, changes: &ProfileChanges) -> StorageResult<()> {
            self.inner.update_profile(id, changes)
        }
        fn set_credential_status(
            &self,
            id: &str,
            is_doctor: Option<bool>,
            status: crate::domain::UserStatus,
            now: chrono::DateTime<Utc>,
        ) -> StorageResult<()> {
            self.inner.set_credential_status(id, is_doctor, status, now)
        }
        fn delete(&self, id: &str) -> StorageResult<bool> {
            UserRepository::delete(self.inner.as_ref(), id)
        }
        fn count(&self) -> StorageResult<usize> {
            UserRepository::count(self.inner.as_ref())
        }
    }

    #[test]
    fn test_concurrent_duplicate_registration_both_succeed() {
        let store = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let mut repos = Repositories::from_store(store.clone());
        repos.users = Arc::new(RendezvousUsers {
            inner: store,
            barrier: Barrier::new(2),
        });
        let fx = fixture_with(repos);

        let results: Vec<Result<UserProfile>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let accounts = fx.services.accounts.clone();
                    scope.spawn(move || accounts.register(register_request("race@example.com")))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("Thread should not panic"))
                .collect()
        });

        assert!(results.iter().all(|r| r.is_ok()));
        let ids: Vec<&str> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|p| p.id.as_str())
            .collect();
        assert_ne!(ids[0], ids[1]);
        assert_eq!(fx.repos.users.count().expect("Should count"), 2);
    }
}
