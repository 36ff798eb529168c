//! Treatment plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::MedicationLine;

/// Treatment plan lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    Planned,
    Active,
    Completed,
    Suspended,
    Cancelled,
}

impl TreatmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentStatus::Planned => "planned",
            TreatmentStatus::Active => "active",
            TreatmentStatus::Completed => "completed",
            TreatmentStatus::Suspended => "suspended",
            TreatmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(TreatmentStatus::Planned),
            "active" => Some(TreatmentStatus::Active),
            "completed" => Some(TreatmentStatus::Completed),
            "suspended" => Some(TreatmentStatus::Suspended),
            "cancelled" => Some(TreatmentStatus::Cancelled),
            _ => None,
        }
    }
}

/// A persisted treatment plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentPlan {
    pub id: String,
    pub bovine_id: String,
    pub diagnosis: Option<String>,
    pub medications: Vec<MedicationLine>,
    /// Sum of line costs at creation time
    pub total_cost: f64,
    pub status: TreatmentStatus,
    pub start_date: DateTime<Utc>,
    pub next_checkup: Option<DateTime<Utc>>,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TreatmentPlan {
    /// Total of the given lines.
    pub fn sum_costs(lines: &[MedicationLine]) -> f64 {
        lines.iter().map(|line| line.cost).sum()
    }
}

/// Input for `create_treatment_plan`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTreatmentPlan {
    pub bovine_id: String,
    pub diagnosis: Option<String>,
    pub medications: Vec<MedicationLine>,
    /// Defaults to now when absent
    pub start_date: Option<DateTime<Utc>>,
    pub next_checkup: Option<DateTime<Utc>>,
}

impl NewTreatmentPlan {
    pub fn new(bovine_id: impl Into<String>, medications: Vec<MedicationLine>) -> Self {
        Self {
            bovine_id: bovine_id.into(),
            diagnosis: None,
            medications,
            start_date: None,
            next_checkup: None,
        }
    }
}
