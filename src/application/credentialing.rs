//! Doctor credentialing: applications, admin decisions, listings and
//! availability.
//!
//! The credential flag lives twice, on the user and on the doctor profile,
//! and each decision writes the two documents in separate calls.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::accounts::{Caller, LIST_LIMIT};
use super::notifications::NotificationService;
use crate::domain::{
    fee_cutoff_text, DoctorApplication, DoctorFilter, DoctorListing, DoctorProfile,
    NotificationKind, UserRef, UserStatus,
};
use crate::ports::Repositories;
use crate::{Result, ServiceError};

const ADMIN_FAN_OUT_LIMIT: usize = 100;
const DETAIL_REVIEW_LIMIT: usize = 10;

/// Query string of `GET /doctor/getalldoctors`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorQuery {
    pub specialization: Option<String>,
    pub min_rating: Option<f64>,
    pub max_fees: Option<f64>,
    pub search: Option<String>,
}

impl DoctorQuery {
    /// Empty strings and zeros count as "no filter".
    fn filter(&self) -> DoctorFilter {
        DoctorFilter {
            credentialed: true,
            specialization: self.specialization.clone().filter(|s| !s.is_empty()),
            min_rating: self.min_rating.filter(|r| *r != 0.0),
            max_fees: self.max_fees.filter(|f| *f != 0.0).map(fee_cutoff_text),
        }
    }
}

/// Body of the accept and reject endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// Doctor profile id
    pub id: Option<String>,
    pub user_id: Option<String>,
}

impl DecisionRequest {
    fn ids(&self) -> Result<(&str, &str)> {
        match (self.id.as_deref(), self.user_id.as_deref()) {
            (Some(id), Some(user_id)) if !id.is_empty() && !user_id.is_empty() => Ok((id, user_id)),
            _ => Err(ServiceError::Validation(
                "Doctor ID and User ID required".to_string(),
            )),
        }
    }
}

/// Body of `PUT /doctor/updateavailability`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityUpdate {
    #[serde(default)]
    pub availability: Vec<Value>,
}

/// Read an application from a request body, unwrapping `formDetails` when
/// present.
fn parse_application(mut body: Value) -> Result<DoctorApplication> {
    let details = match body.get_mut("formDetails") {
        Some(inner) => inner.take(),
        None => body,
    };
    serde_json::from_value(details)
        .map_err(|e| ServiceError::Validation(format!("Invalid application: {e}")))
}

/// Service for the doctor credentialing workflow.
#[derive(Clone)]
pub struct DoctorService {
    repos: Repositories,
    notifier: NotificationService,
}

impl DoctorService {
    pub fn new(repos: Repositories, notifier: NotificationService) -> Self {
        Self { repos, notifier }
    }

    /// Submit the caller's application and tell every admin about it.
    ///
    /// # Errors
    /// `Validation` if the caller already has a profile or the body does not
    /// parse.
    pub fn apply(&self, caller: &Caller, body: Value) -> Result<DoctorProfile> {
        if self.repos.doctors.find_by_user(caller.id())?.is_some() {
            return Err(ServiceError::Validation(
                "Application already submitted".to_string(),
            ));
        }

        let application = parse_application(body)?;
        let profile = DoctorProfile::from_application(caller.id(), application);
        self.repos.doctors.insert(&profile)?;
        tracing::info!("Doctor application {} submitted by {}", profile.id, caller.id());

        let admins = self.repos.users.list_admins(ADMIN_FAN_OUT_LIMIT)?;
        let content = format!("{} has applied to be a doctor.", caller.user.full_name());
        self.notifier
            .notify_all(&admins, &content, NotificationKind::Application)?;

        Ok(profile)
    }

    /// Credentialed doctors joined with their users. Profiles whose user is
    /// gone are dropped.
    ///
    /// # Errors
    /// Returns error if a query fails.
    pub fn list_doctors(&self, query: &DoctorQuery) -> Result<Vec<DoctorListing>> {
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let profiles = self.repos.doctors.search(&query.filter(), LIST_LIMIT)?;
        let mut listings = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let Some(user) = self.repos.users.find(&profile.user_id)? else {
                continue;
            };
            if let Some(needle) = &needle {
                if !user.full_name().to_lowercase().contains(needle) {
                    continue;
                }
            }
            listings.push(DoctorListing::new(profile, UserRef::Resolved(Box::new(user.profile))));
        }

        Ok(listings)
    }

    /// One profile with its user and its ten newest reviews.
    ///
    /// Reviews are looked up by profile id, while reviews are written with
    /// the doctor's user id, so this list is usually empty.
    ///
    /// # Errors
    /// `NotFound` if there is no such profile.
    pub fn get_doctor(&self, id: &str) -> Result<DoctorListing> {
        let profile = self
            .repos
            .doctors
            .find(id)?
            .ok_or_else(|| ServiceError::NotFound("Doctor not found".to_string()))?;

        let owner = match self.repos.users.find(&profile.user_id)? {
            Some(user) => UserRef::Resolved(Box::new(user.profile)),
            None => UserRef::Dangling(profile.user_id.clone()),
        };
        let reviews = self.repos.reviews.for_doctor(id, DETAIL_REVIEW_LIMIT)?;

        Ok(DoctorListing::new(profile, owner).with_reviews(reviews))
    }

    /// Pending applications joined with their users.
    ///
    /// # Errors
    /// Returns error if a query fails.
    pub fn list_applications(&self) -> Result<Vec<DoctorListing>> {
        let profiles = self
            .repos
            .doctors
            .search(&DoctorFilter::applications(), LIST_LIMIT)?;

        let mut listings = Vec::with_capacity(profiles.len());
        for profile in profiles {
            if let Some(user) = self.repos.users.find(&profile.user_id)? {
                listings.push(DoctorListing::new(profile, UserRef::Resolved(Box::new(user.profile))));
            }
        }
        Ok(listings)
    }

    /// Admin-only. Credential the profile and the user.
    ///
    /// # Errors
    /// `Forbidden` for non-admins, `Validation` without both ids.
    pub fn accept(&self, caller: &Caller, request: &DecisionRequest) -> Result<()> {
        caller.require_admin()?;
        let (id, user_id) = request.ids()?;
        let now = Utc::now();

        self.repos.doctors.mark_credentialed(id, now)?;
        self.repos
            .users
            .set_credential_status(user_id, Some(true), UserStatus::Accepted, now)?;
        tracing::info!("Admin {} accepted doctor application {}", caller.id(), id);

        self.notifier.notify(
            user_id,
            "Congratulations! Your doctor application has been accepted.",
            NotificationKind::Success,
        )
    }

    /// Admin-only. Delete the application and mark the user rejected.
    ///
    /// # Errors
    /// `Forbidden` for non-admins, `Validation` without both ids.
    pub fn reject(&self, caller: &Caller, request: &DecisionRequest) -> Result<()> {
        caller.require_admin()?;
        let (id, user_id) = request.ids()?;

        self.repos.doctors.delete(id)?;
        self.repos
            .users
            .set_credential_status(user_id, None, UserStatus::Rejected, Utc::now())?;
        tracing::warn!("Admin {} rejected doctor application {}", caller.id(), id);

        self.notifier.notify(
            user_id,
            "Sorry, your doctor application has been rejected.",
            NotificationKind::Error,
        )
    }

    /// Admin-only. Remove a doctor's profile and return the user to pending.
    ///
    /// # Errors
    /// `Forbidden` for non-admins, `Validation` without a user id.
    pub fn remove(&self, caller: &Caller, user_id: Option<&str>) -> Result<()> {
        caller.require_admin()?;
        let user_id = user_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::Validation("User ID required".to_string()))?;

        self.repos.doctors.delete_by_user(user_id)?;
        self.repos
            .users
            .set_credential_status(user_id, Some(false), UserStatus::Pending, Utc::now())?;
        tracing::warn!("Admin {} removed doctor {}", caller.id(), user_id);
        Ok(())
    }

    /// Replace the caller's availability list.
    ///
    /// # Errors
    /// `Forbidden` unless the caller's stored user is a doctor.
    pub fn update_availability(&self, caller: &Caller, update: AvailabilityUpdate) -> Result<()> {
        if !caller.is_doctor() {
            return Err(ServiceError::Forbidden(
                "Only doctors can update availability".to_string(),
            ));
        }

        self.repos
            .doctors
            .set_availability(caller.id(), &update.availability, Utc::now())?;
        tracing::info!("Doctor {} updated availability", caller.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::testing::fixture;
    use crate::domain::Review;

    #[test]
    fn test_apply_notifies_every_admin() {
        let fx = fixture();
        let admin = fx.admin();
        let user = fx.register("Grace", "Hopper", "grace@example.com");
        let caller = fx.caller(&user);

        let profile = fx
            .services
            .doctors
            .apply(&caller, json!({"formDetails": {"specialization": "Cardiology", "fees": 300}}))
            .expect("Should apply");
        assert_eq!(profile.specialization, "Cardiology");
        assert_eq!(profile.fees, json!(300));
        assert!(!profile.is_doctor);

        let inbox = fx.services.notifications.list(admin.id()).expect("Should list");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].content, "Grace Hopper has applied to be a doctor.");
        assert_eq!(inbox[0].kind, NotificationKind::Application);
    }

    #[test]
    fn test_apply_accepts_unwrapped_body() {
        let fx = fixture();
        let caller = fx.caller(&fx.register("Grace", "Hopper", "grace@example.com"));

        let profile = fx
            .services
            .doctors
            .apply(&caller, json!({"specialization": "Neurology", "experience": 12}))
            .expect("Should apply");
        assert_eq!(profile.specialization, "Neurology");
        assert_eq!(profile.experience, json!(12));
        assert_eq!(profile.fees, json!(""));
    }

    #[test]
    fn test_second_application_is_rejected() {
        let fx = fixture();
        let caller = fx.caller(&fx.register("Grace", "Hopper", "grace@example.com"));
        fx.services.doctors.apply(&caller, json!({})).expect("Should apply");

        let err = fx
            .services
            .doctors
            .apply(&caller, json!({}))
            .expect_err("Should refuse");
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "Application already submitted"));
    }

    #[test]
    fn test_accept_flips_both_flags() {
        let fx = fixture();
        let admin = fx.admin();
        let user = fx.register("Grace", "Hopper", "grace@example.com");
        let profile = fx
            .services
            .doctors
            .apply(&fx.caller(&user), json!({}))
            .expect("Should apply");

        let request = DecisionRequest {
            id: Some(profile.id.clone()),
            user_id: Some(user.id().to_string()),
        };
        fx.services.doctors.accept(&admin, &request).expect("Should accept");

        let stored = fx.repos.users.find(user.id()).expect("Should find").expect("Should exist");
        assert!(stored.profile.is_doctor);
        assert_eq!(stored.profile.status, UserStatus::Accepted);
        let stored = fx.repos.doctors.find(&profile.id).expect("Should find").expect("Should exist");
        assert!(stored.is_doctor);

        let inbox = fx.services.notifications.list(user.id()).expect("Should list");
        assert_eq!(inbox[0].kind, NotificationKind::Success);
        assert_eq!(inbox[0].content, "Congratulations! Your doctor application has been accepted.");
    }

    #[test]
    fn test_reject_deletes_application() {
        let fx = fixture();
        let admin = fx.admin();
        let user = fx.register("Grace", "Hopper", "grace@example.com");
        let profile = fx
            .services
            .doctors
            .apply(&fx.caller(&user), json!({}))
            .expect("Should apply");

        let request = DecisionRequest {
            id: Some(profile.id.clone()),
            user_id: Some(user.id().to_string()),
        };
        fx.services.doctors.reject(&admin, &request).expect("Should reject");

        assert!(fx.repos.doctors.find(&profile.id).expect("Should query").is_none());
        let stored = fx.repos.users.find(user.id()).expect("Should find").expect("Should exist");
        assert_eq!(stored.profile.status, UserStatus::Rejected);
        assert!(!stored.profile.is_doctor);

        let inbox = fx.services.notifications.list(user.id()).expect("Should list");
        assert_eq!(inbox[0].kind, NotificationKind::Error);
    }

    #[test]
    fn test_decisions_need_admin_and_both_ids() {
        let fx = fixture();
        let admin = fx.admin();
        let caller = fx.caller(&fx.register("Grace", "Hopper", "grace@example.com"));
        let full = DecisionRequest {
            id: Some("p".into()),
            user_id: Some("u".into()),
        };
        let partial = DecisionRequest {
            id: Some("p".into()),
            user_id: None,
        };

        assert!(matches!(
            fx.services.doctors.accept(&caller, &full),
            Err(ServiceError::Forbidden(_))
        ));
        for result in [
            fx.services.doctors.accept(&admin, &partial),
            fx.services.doctors.reject(&admin, &partial),
        ] {
            assert!(matches!(result, Err(ServiceError::Validation(ref m)) if m == "Doctor ID and User ID required"));
        }
        assert!(matches!(
            fx.services.doctors.remove(&admin, Some("")),
            Err(ServiceError::Validation(ref m)) if m == "User ID required"
        ));
    }

    #[test]
    fn test_remove_returns_user_to_pending() {
        let fx = fixture();
        let admin = fx.admin();
        let (doctor, _) = fx.doctor("Grace", "Hopper", "grace@example.com", "Cardiology");

        fx.services
            .doctors
            .remove(&admin, Some(doctor.id()))
            .expect("Should remove");

        assert!(fx.repos.doctors.find_by_user(doctor.id()).expect("Should query").is_none());
        let stored = fx.repos.users.find(doctor.id()).expect("Should find").expect("Should exist");
        assert!(!stored.profile.is_doctor);
        assert_eq!(stored.profile.status, UserStatus::Pending);
    }

    #[test]
    fn test_list_doctors_filters() {
        let fx = fixture();
        fx.doctor("Grace", "Hopper", "grace@example.com", "Cardiology");
        fx.doctor("Alan", "Turing", "alan@example.com", "Neurology");
        let pending = fx.register("Pending", "Person", "pending@example.com");
        fx.services
            .doctors
            .apply(&fx.caller(&pending), json!({"specialization": "Cardiology"}))
            .expect("Should apply");

        let all = fx.services.doctors.list_doctors(&DoctorQuery::default()).expect("Should list");
        assert_eq!(all.len(), 2);

        let query = DoctorQuery {
            specialization: Some("cardio".into()),
            ..DoctorQuery::default()
        };
        let found = fx.services.doctors.list_doctors(&query).expect("Should list");
        assert_eq!(found.len(), 1);
        assert!(matches!(&found[0].user_id, UserRef::Resolved(u) if u.firstname == "Grace"));

        let query = DoctorQuery {
            search: Some("TUR".into()),
            ..DoctorQuery::default()
        };
        let found = fx.services.doctors.list_doctors(&query).expect("Should list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].specialization, "Neurology");

        // Zero filters are ignored.
        let query = DoctorQuery {
            min_rating: Some(0.0),
            max_fees: Some(0.0),
            ..DoctorQuery::default()
        };
        assert_eq!(fx.services.doctors.list_doctors(&query).expect("Should list").len(), 2);

        let query = DoctorQuery {
            min_rating: Some(1.0),
            ..DoctorQuery::default()
        };
        assert!(fx.services.doctors.list_doctors(&query).expect("Should list").is_empty());
    }

    #[test]
    fn test_max_fees_compares_as_text() {
        let fx = fixture();
        // Fixture doctors charge "300".
        fx.doctor("Grace", "Hopper", "grace@example.com", "Cardiology");

        let query = |max: f64| DoctorQuery {
            max_fees: Some(max),
            ..DoctorQuery::default()
        };
        assert_eq!(fx.services.doctors.list_doctors(&query(500.0)).expect("Should list").len(), 1);
        // "300" > "1000.0" as text.
        assert!(fx.services.doctors.list_doctors(&query(1000.0)).expect("Should list").is_empty());
    }

    #[test]
    fn test_listings_drop_profiles_without_user() {
        let fx = fixture();
        let (doctor, _) = fx.doctor("Grace", "Hopper", "grace@example.com", "Cardiology");
        fx.repos.users.delete(doctor.id()).expect("Should delete");

        assert!(fx.services.doctors.list_doctors(&DoctorQuery::default()).expect("Should list").is_empty());
    }

    #[test]
    fn test_get_doctor_keeps_dangling_owner() {
        let fx = fixture();
        let (doctor, profile) = fx.doctor("Grace", "Hopper", "grace@example.com", "Cardiology");

        fx.repos
            .reviews
            .insert(&Review::new("p", "P", "", profile.id.as_str(), 5, "by profile id", None))
            .expect("Should insert");
        fx.repos
            .reviews
            .insert(&Review::new("p", "P", "", doctor.id(), 4, "by user id", None))
            .expect("Should insert");

        let listing = fx.services.doctors.get_doctor(&profile.id).expect("Should get");
        let reviews = listing.reviews.expect("Should embed reviews");
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].comment, "by profile id");

        fx.repos.users.delete(doctor.id()).expect("Should delete");
        let listing = fx.services.doctors.get_doctor(&profile.id).expect("Should get");
        assert_eq!(listing.user_id, UserRef::Dangling(doctor.id().to_string()));

        assert!(matches!(
            fx.services.doctors.get_doctor("missing"),
            Err(ServiceError::NotFound(ref m)) if m == "Doctor not found"
        ));
    }

    #[test]
    fn test_list_applications() {
        let fx = fixture();
        fx.doctor("Grace", "Hopper", "grace@example.com", "Cardiology");
        let pending = fx.register("Pending", "Person", "pending@example.com");
        fx.services
            .doctors
            .apply(&fx.caller(&pending), json!({}))
            .expect("Should apply");

        let apps = fx.services.doctors.list_applications().expect("Should list");
        assert_eq!(apps.len(), 1);
        assert!(matches!(&apps[0].user_id, UserRef::Resolved(u) if u.id == pending.id()));
    }

    #[test]
    fn test_availability_is_doctor_only() {
        let fx = fixture();
        let patient = fx.caller(&fx.register("Pat", "Ient", "pat@example.com"));
        let (doctor, profile) = fx.doctor("Grace", "Hopper", "grace@example.com", "Cardiology");

        let update = AvailabilityUpdate {
            availability: vec![json!({"day": "Monday", "slots": ["09:00"]})],
        };
        assert!(matches!(
            fx.services.doctors.update_availability(&patient, update.clone()),
            Err(ServiceError::Forbidden(ref m)) if m == "Only doctors can update availability"
        ));

        fx.services
            .doctors
            .update_availability(&fx.caller(&doctor), update)
            .expect("Should update");
        let stored = fx.repos.doctors.find(&profile.id).expect("Should find").expect("Should exist");
        assert_eq!(stored.availability.len(), 1);
    }
}
