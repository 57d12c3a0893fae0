//! Doctor profiles and the views built on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::new_id;
use super::review::Review;
use super::user::UserProfile;

/// Practice details submitted with a doctor application.
///
/// `experience` and `fees` are kept exactly as submitted (string or number).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorApplication {
    #[serde(default)]
    pub specialization: String,
    #[serde(default = "blank")]
    pub experience: Value,
    #[serde(default = "blank")]
    pub fees: Value,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub availability: Vec<Value>,
}

fn blank() -> Value {
    Value::String(String::new())
}

/// Credentialing and practice record, one per doctor-aspirant user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning user. Not enforced by the store, may dangle.
    pub user_id: String,
    pub specialization: String,
    pub experience: Value,
    pub fees: Value,
    pub about: String,
    pub education: String,
    pub availability: Vec<Value>,
    /// Mean review rating, recomputed on every new review
    pub rating: f64,
    pub total_reviews: u64,
    pub total_patients: u64,
    /// Credentialing flag, independent of the user's own `isDoctor`
    pub is_doctor: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DoctorProfile {
    /// Create an uncredentialed profile from an application.
    #[must_use]
    pub fn from_application(user_id: impl Into<String>, application: DoctorApplication) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.into(),
            specialization: application.specialization,
            experience: application.experience,
            fees: application.fees,
            about: application.about,
            education: application.education,
            availability: application.availability,
            rating: 0.0,
            total_reviews: 0,
            total_patients: 0,
            is_doctor: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Owner reference of a listed profile: the joined user when it still
/// exists, otherwise the raw id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserRef {
    Resolved(Box<UserProfile>),
    Dangling(String),
}

/// A doctor profile with its owner joined in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorListing {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: UserRef,
    pub specialization: String,
    pub experience: Value,
    pub fees: Value,
    pub about: String,
    pub education: String,
    pub availability: Vec<Value>,
    pub rating: f64,
    pub total_reviews: u64,
    pub total_patients: u64,
    pub is_doctor: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
}

impl DoctorListing {
    #[must_use]
    pub fn new(profile: DoctorProfile, owner: UserRef) -> Self {
        Self {
            id: profile.id,
            user_id: owner,
            specialization: profile.specialization,
            experience: profile.experience,
            fees: profile.fees,
            about: profile.about,
            education: profile.education,
            availability: profile.availability,
            rating: profile.rating,
            total_reviews: profile.total_reviews,
            total_patients: profile.total_patients,
            is_doctor: profile.is_doctor,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
            reviews: None,
        }
    }

    #[must_use]
    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Self {
        self.reviews = Some(reviews);
        self
    }
}

/// Store-side filter for doctor profile listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorFilter {
    /// Match on the profile's credentialing flag
    pub credentialed: bool,
    /// Case-insensitive substring of the specialization
    pub specialization: Option<String>,
    /// Minimum rating, inclusive
    pub min_rating: Option<f64>,
    /// Upper bound on fees, compared as text against text-typed fees only
    pub max_fees: Option<String>,
}

impl DoctorFilter {
    #[must_use]
    pub fn credentialed() -> Self {
        Self {
            credentialed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn applications() -> Self {
        Self::default()
    }
}

/// Render a numeric fee cutoff the way it is compared against stored text.
///
/// Follows Python's `str(float)`: integral values keep a trailing `.0`
/// (`500` becomes `"500.0"`), and magnitudes from `1e16` up or below `1e-4`
/// use exponent form with a signed two-digit exponent (`"1e+16"`,
/// `"1.5e-05"`). The comparison is lexicographic against that exact text.
#[must_use]
pub fn fee_cutoff_text(max_fees: f64) -> String {
    if max_fees.is_nan() {
        return "nan".to_string();
    }
    if max_fees.is_infinite() {
        return if max_fees > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = max_fees.abs();
    if magnitude >= 1e16 || (magnitude != 0.0 && magnitude < 1e-4) {
        let text = format!("{max_fees:e}");
        return match text.split_once('e').map(|(m, e)| (m, e.parse::<i32>())) {
            Some((mantissa, Ok(exp))) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
            }
            _ => text,
        };
    }

    if max_fees.fract() == 0.0 {
        format!("{max_fees:.1}")
    } else {
        max_fees.to_string()
    }
}
