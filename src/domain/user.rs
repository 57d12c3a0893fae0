//! User accounts.
//!
//! A stored [`User`] carries the password digest next to its public
//! [`UserProfile`]. Everything that leaves the service is a `UserProfile`,
//! so the digest is never serialized into a response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::new_id;

/// Avatar assigned when registration does not supply one.
pub const DEFAULT_AVATAR: &str =
    "https://icon-library.com/images/anonymous-avatar-icon/anonymous-avatar-icon-25.jpg";

/// Doctor-credentialing status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// No decision yet (also the state after a doctor is removed)
    Pending,
    /// Doctor application accepted
    Accepted,
    /// Doctor application rejected
    Rejected,
}

/// Public part of a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub pic: String,
    pub age: Option<String>,
    pub mobile: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub emergency_contact: Option<String>,
    pub is_admin: bool,
    pub is_doctor: bool,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub profile: UserProfile,

    /// Password digest in PHC string format
    #[serde(rename = "password")]
    pub password_digest: String,
}

impl User {
    /// Create a fresh account with default profile fields.
    #[must_use]
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
        password_digest: impl Into<String>,
        pic: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            profile: UserProfile {
                id: new_id(),
                firstname: firstname.into(),
                lastname: lastname.into(),
                email: email.into(),
                pic: pic.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
                age: None,
                mobile: None,
                gender: Some("neither".to_string()),
                address: None,
                blood_group: None,
                allergies: None,
                emergency_contact: None,
                is_admin: false,
                is_doctor: false,
                status: UserStatus::Pending,
                created_at: now,
                updated_at: now,
            },
            password_digest: password_digest.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.profile.id
    }

    /// "First Last", as shown in notifications.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.profile.firstname, self.profile.lastname)
    }
}

/// A partial profile update. Unset fields are left untouched in the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub password_digest: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = User::new("Ada", "Lovelace", "ada@example.com", "$argon2id$x", None);

        assert_eq!(user.profile.pic, DEFAULT_AVATAR);
        assert_eq!(user.profile.gender.as_deref(), Some("neither"));
        assert_eq!(user.profile.status, UserStatus::Pending);
        assert!(!user.profile.is_admin);
        assert!(!user.profile.is_doctor);
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_profile_never_serializes_digest() {
        let user = User::new("Ada", "Lovelace", "ada@example.com", "$argon2id$secret", None);

        let stored = serde_json::to_value(&user).expect("Should serialize");
        assert_eq!(stored["password"], "$argon2id$secret");
        assert_eq!(stored["_id"], user.profile.id.as_str());

        let public = serde_json::to_value(&user.profile).expect("Should serialize");
        assert!(public.get("password").is_none());
        assert_eq!(public["isDoctor"], false);
        assert_eq!(public["status"], "pending");
    }

    #[test]
    fn test_stored_document_roundtrip() {
        let user = User::new("Ada", "Lovelace", "ada@example.com", "digest", Some("p.png".into()));
        let json = serde_json::to_string(&user).expect("Should serialize");
        let back: User = serde_json::from_str(&json).expect("Should deserialize");

        assert_eq!(back.profile, user.profile);
        assert_eq!(back.password_digest, "digest");
    }

    #[test]
    fn test_changes_skip_unset_fields() {
        let changes = ProfileChanges {
            firstname: None,
            lastname: None,
            email: None,
            age: Some("41".into()),
            mobile: None,
            gender: None,
            address: None,
            blood_group: Some("O+".into()),
            allergies: None,
            emergency_contact: None,
            password_digest: None,
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&changes).expect("Should serialize");
        let obj = json.as_object().expect("Should be an object");
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["bloodGroup"], "O+");
        assert!(obj.contains_key("updatedAt"));
    }
}
