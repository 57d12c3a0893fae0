//! Rule-based symptom triage.
//!
//! Maps free-text symptom phrases to candidate conditions, a severity tier,
//! recommendations and suggested specializations using a static table.
//! Pure: no state, no I/O.

use serde::{Deserialize, Serialize};

/// Severity tier, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Fixed advice for this tier.
    #[must_use]
    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Self::High => &[
                "Seek immediate medical attention",
                "Visit the nearest emergency room",
                "Call emergency services if symptoms worsen",
            ],
            Self::Medium => &[
                "Schedule an appointment with a doctor soon",
                "Monitor your symptoms closely",
                "Stay hydrated and rest",
            ],
            Self::Low => &[
                "Rest and monitor your symptoms",
                "Stay hydrated",
                "Consider over-the-counter remedies",
                "Consult a doctor if symptoms persist",
            ],
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

struct SymptomRule {
    key: &'static str,
    conditions: [&'static str; 4],
    severity: Severity,
}

/// Canonical symptoms in match order.
const SYMPTOM_TABLE: &[SymptomRule] = &[
    SymptomRule {
        key: "headache",
        conditions: ["Migraine", "Tension Headache", "Sinusitis", "Dehydration"],
        severity: Severity::Low,
    },
    SymptomRule {
        key: "fever",
        conditions: ["Flu", "Viral Infection", "COVID-19", "Bacterial Infection"],
        severity: Severity::Medium,
    },
    SymptomRule {
        key: "cough",
        conditions: ["Common Cold", "Bronchitis", "Asthma", "Allergies"],
        severity: Severity::Low,
    },
    SymptomRule {
        key: "chest pain",
        conditions: ["Angina", "Heart Attack", "Acid Reflux", "Muscle Strain"],
        severity: Severity::High,
    },
    SymptomRule {
        key: "fatigue",
        conditions: ["Anemia", "Thyroid Issues", "Sleep Disorders", "Depression"],
        severity: Severity::Low,
    },
    SymptomRule {
        key: "shortness of breath",
        conditions: ["Asthma", "Anxiety", "Heart Failure", "Pneumonia"],
        severity: Severity::High,
    },
    SymptomRule {
        key: "nausea",
        conditions: ["Food Poisoning", "Gastritis", "Pregnancy", "Motion Sickness"],
        severity: Severity::Low,
    },
    SymptomRule {
        key: "dizziness",
        conditions: ["Vertigo", "Low Blood Pressure", "Anemia", "Inner Ear Issues"],
        severity: Severity::Medium,
    },
    SymptomRule {
        key: "sore throat",
        conditions: ["Strep Throat", "Viral Infection", "Allergies", "Tonsillitis"],
        severity: Severity::Low,
    },
    SymptomRule {
        key: "stomach pain",
        conditions: ["Gastritis", "Appendicitis", "Food Poisoning", "IBS"],
        severity: Severity::Medium,
    },
    SymptomRule {
        key: "back pain",
        conditions: ["Muscle Strain", "Herniated Disc", "Arthritis", "Poor Posture"],
        severity: Severity::Low,
    },
    SymptomRule {
        key: "joint pain",
        conditions: ["Arthritis", "Gout", "Lupus", "Injury"],
        severity: Severity::Medium,
    },
    SymptomRule {
        key: "skin rash",
        conditions: ["Allergic Reaction", "Eczema", "Psoriasis", "Infection"],
        severity: Severity::Low,
    },
    SymptomRule {
        key: "anxiety",
        conditions: ["Anxiety Disorder", "Panic Attack", "Stress", "Thyroid Issues"],
        severity: Severity::Medium,
    },
    SymptomRule {
        key: "insomnia",
        conditions: ["Sleep Disorder", "Anxiety", "Depression", "Sleep Apnea"],
        severity: Severity::Low,
    },
];

/// Specialization suggestions. A rule fires only when one of its symptoms
/// is an exact (lower-cased) element of the input.
const SPECIALIZATION_RULES: &[(&str, &[&str])] = &[
    ("Cardiologist", &["chest pain", "shortness of breath"]),
    ("Neurologist", &["headache", "dizziness"]),
    ("Gastroenterologist", &["stomach pain", "nausea"]),
    ("Dermatologist", &["skin rash"]),
    ("Psychiatrist", &["anxiety", "insomnia"]),
];

/// Maximum number of conditions reported.
pub const MAX_CONDITIONS: usize = 5;

pub const DEFAULT_CONDITION: &str = "General Health Concern";
pub const DEFAULT_SPECIALIZATION: &str = "General Physician";
pub const DISCLAIMER: &str = "This is an AI-powered preliminary assessment. Please consult a healthcare professional for accurate diagnosis.";

/// Triage input. `age` and `gender` are accepted but do not affect scoring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymptomQuery {
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl SymptomQuery {
    #[must_use]
    pub fn new<I, S>(symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symptoms: symptoms.into_iter().map(Into::into).collect(),
            age: None,
            gender: None,
        }
    }
}

/// Triage outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageReport {
    /// Input echoed back unchanged
    pub symptoms: Vec<String>,
    pub possible_conditions: Vec<&'static str>,
    pub severity: Severity,
    pub recommendations: Vec<&'static str>,
    pub suggested_specializations: Vec<&'static str>,
    pub disclaimer: &'static str,
}

/// Run the symptom checker.
#[must_use]
pub fn triage(query: &SymptomQuery) -> TriageReport {
    let symptoms: Vec<String> = query.symptoms.iter().map(|s| s.to_lowercase()).collect();

    let mut conditions: Vec<&'static str> = Vec::new();
    let mut severity = Severity::Low;

    for symptom in &symptoms {
        for rule in SYMPTOM_TABLE {
            if !(symptom.contains(rule.key) || rule.key.contains(symptom.as_str())) {
                continue;
            }
            for condition in rule.conditions {
                if !conditions.contains(&condition) {
                    conditions.push(condition);
                }
            }
            severity = severity.max(rule.severity);
        }
    }

    let possible_conditions = if conditions.is_empty() {
        vec![DEFAULT_CONDITION]
    } else {
        conditions.truncate(MAX_CONDITIONS);
        conditions
    };

    let mut specializations: Vec<&'static str> = SPECIALIZATION_RULES
        .iter()
        .filter(|(_, triggers)| triggers.iter().any(|t| symptoms.iter().any(|s| s == t)))
        .map(|(name, _)| *name)
        .collect();
    if specializations.is_empty() {
        specializations.push(DEFAULT_SPECIALIZATION);
    }

    TriageReport {
        symptoms: query.symptoms.clone(),
        possible_conditions,
        severity,
        recommendations: severity.recommendations().to_vec(),
        suggested_specializations: specializations,
        disclaimer: DISCLAIMER,
    }
}
