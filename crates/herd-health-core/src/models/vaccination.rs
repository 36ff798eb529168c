//! Vaccination events and the follow-up schedule derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::location::GeoLocation;

/// Follow-up state of a vaccination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationStatus {
    /// Follow-up dose at `next_due_date` is pending
    Scheduled,
    /// A later dose of the same vaccine has been recorded
    Completed,
    /// Follow-up passed its due date without a new dose
    Overdue,
    Cancelled,
    Rescheduled,
}

impl VaccinationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VaccinationStatus::Scheduled => "scheduled",
            VaccinationStatus::Completed => "completed",
            VaccinationStatus::Overdue => "overdue",
            VaccinationStatus::Cancelled => "cancelled",
            VaccinationStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(VaccinationStatus::Scheduled),
            "completed" => Some(VaccinationStatus::Completed),
            "overdue" => Some(VaccinationStatus::Overdue),
            "cancelled" => Some(VaccinationStatus::Cancelled),
            "rescheduled" => Some(VaccinationStatus::Rescheduled),
            _ => None,
        }
    }

    /// Whether the follow-up is still waiting for the next dose.
    pub fn is_open(&self) -> bool {
        matches!(self, VaccinationStatus::Scheduled | VaccinationStatus::Overdue)
    }
}

/// A recorded vaccination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vaccination {
    pub id: String,
    pub bovine_id: String,
    pub vaccine_id: String,
    pub vaccine_name: String,
    pub administration_date: DateTime<Utc>,
    pub location: GeoLocation,
    /// Doses drawn from stock
    pub dose_quantity: f64,
    pub batch_number: Option<String>,
    /// Always strictly after `administration_date` when present
    pub next_due_date: Option<DateTime<Utc>>,
    pub status: VaccinationStatus,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

/// Input for `record_vaccination`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVaccination {
    pub bovine_id: String,
    pub vaccine_id: String,
    pub vaccine_name: String,
    pub administration_date: DateTime<Utc>,
    pub location: GeoLocation,
    pub dose_quantity: f64,
    pub batch_number: Option<String>,
}

impl NewVaccination {
    /// Create an input for a single dose.
    pub fn new(
        bovine_id: impl Into<String>,
        vaccine_id: impl Into<String>,
        vaccine_name: impl Into<String>,
        administration_date: DateTime<Utc>,
        location: GeoLocation,
    ) -> Self {
        Self {
            bovine_id: bovine_id.into(),
            vaccine_id: vaccine_id.into(),
            vaccine_name: vaccine_name.into(),
            administration_date,
            location,
            dose_quantity: 1.0,
            batch_number: None,
        }
    }
}

/// Urgency of an upcoming vaccination. Ordered low to urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// An upcoming follow-up vaccination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaccinationScheduleItem {
    /// Vaccination whose follow-up this is
    pub vaccination_id: String,
    pub bovine_id: String,
    pub vaccine_id: String,
    pub vaccine_name: String,
    pub scheduled_date: DateTime<Utc>,
    pub last_administered: DateTime<Utc>,
    pub days_until_due: i64,
    pub priority: SchedulePriority,
}
