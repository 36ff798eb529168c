//! Disease cases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clinical severity of a disease case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseSeverity {
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl DiseaseSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseSeverity::Mild => "mild",
            DiseaseSeverity::Moderate => "moderate",
            DiseaseSeverity::Severe => "severe",
            DiseaseSeverity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mild" => Some(DiseaseSeverity::Mild),
            "moderate" => Some(DiseaseSeverity::Moderate),
            "severe" => Some(DiseaseSeverity::Severe),
            "critical" => Some(DiseaseSeverity::Critical),
            _ => None,
        }
    }
}

/// Diagnostic/outcome state of a disease case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseStatus {
    Suspected,
    Confirmed,
    Treated,
    Recovered,
    Chronic,
    Deceased,
}

impl DiseaseStatus {
    /// Statuses that count as an active disease.
    pub const ACTIVE: [DiseaseStatus; 3] = [
        DiseaseStatus::Suspected,
        DiseaseStatus::Confirmed,
        DiseaseStatus::Treated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseStatus::Suspected => "suspected",
            DiseaseStatus::Confirmed => "confirmed",
            DiseaseStatus::Treated => "treated",
            DiseaseStatus::Recovered => "recovered",
            DiseaseStatus::Chronic => "chronic",
            DiseaseStatus::Deceased => "deceased",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "suspected" => Some(DiseaseStatus::Suspected),
            "confirmed" => Some(DiseaseStatus::Confirmed),
            "treated" => Some(DiseaseStatus::Treated),
            "recovered" => Some(DiseaseStatus::Recovered),
            "chronic" => Some(DiseaseStatus::Chronic),
            "deceased" => Some(DiseaseStatus::Deceased),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

/// A persisted disease case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseRecord {
    pub id: String,
    pub bovine_id: String,
    pub disease_name: String,
    pub severity: DiseaseSeverity,
    pub status: DiseaseStatus,
    pub detection_date: DateTime<Utc>,
    pub is_contagious: bool,
    pub is_reportable: bool,
    pub quarantine_required: bool,
    pub quarantine_end_date: Option<DateTime<Utc>>,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for `record_disease`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDiseaseRecord {
    pub bovine_id: String,
    pub disease_name: String,
    pub severity: DiseaseSeverity,
    pub status: DiseaseStatus,
    pub detection_date: DateTime<Utc>,
    pub is_contagious: bool,
    pub is_reportable: bool,
    pub quarantine_required: bool,
    /// Defaults to detection date plus the configured quarantine period
    pub quarantine_end_date: Option<DateTime<Utc>>,
}

impl NewDiseaseRecord {
    /// A confirmed, non-contagious case.
    pub fn new(
        bovine_id: impl Into<String>,
        disease_name: impl Into<String>,
        severity: DiseaseSeverity,
        detection_date: DateTime<Utc>,
    ) -> Self {
        Self {
            bovine_id: bovine_id.into(),
            disease_name: disease_name.into(),
            severity,
            status: DiseaseStatus::Confirmed,
            detection_date,
            is_contagious: false,
            is_reportable: false,
            quarantine_required: false,
            quarantine_end_date: None,
        }
    }
}
