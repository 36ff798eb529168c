//! Collaborators the engine depends on but does not implement.
//!
//! Every method returns [`anyhow::Result`] so integrators can surface any
//! error type. The engine never lets a collaborator error roll back a stored
//! record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DiseaseRecord, HealthAlert, Vaccination};

/// Which stored entity a confirmation refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    MedicalRecord,
    Vaccination,
}

/// Receipt sent to the recording user after a successful write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordConfirmation {
    pub kind: RecordKind,
    pub record_id: String,
    pub bovine_id: String,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
}

/// Outbound messaging.
pub trait Notifier: Send + Sync {
    fn send_health_alert(&self, alert: &HealthAlert) -> anyhow::Result<()>;
    fn send_vaccination_reminder(
        &self,
        vaccination: &Vaccination,
        due_date: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    fn send_record_confirmation(&self, confirmation: &RecordConfirmation) -> anyhow::Result<()>;
}

/// Medication and vaccine stock.
pub trait InventoryManager: Send + Sync {
    fn check_availability(&self, item_id: &str, quantity: f64) -> anyhow::Result<bool>;
    fn reserve(&self, item_id: &str, quantity: f64) -> anyhow::Result<()>;
    /// Undo an earlier `reserve`.
    fn release(&self, item_id: &str, quantity: f64) -> anyhow::Result<()>;
    fn consume(&self, item_id: &str, quantity: f64) -> anyhow::Result<()>;
}

/// Coordinate checks and reverse lookup.
pub trait GeoLocator: Send + Sync {
    fn is_valid_coordinate(&self, latitude: f64, longitude: f64) -> anyhow::Result<bool>;
    /// Human-readable address for a coordinate, if one is known.
    fn describe(&self, latitude: f64, longitude: f64) -> anyhow::Result<Option<String>>;
}

/// An animal as listed by the herd directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HerdMember {
    pub bovine_id: String,
    pub deceased: bool,
}

impl HerdMember {
    pub fn alive(bovine_id: impl Into<String>) -> Self {
        Self {
            bovine_id: bovine_id.into(),
            deceased: false,
        }
    }
}

/// Ranch membership.
pub trait HerdDirectory: Send + Sync {
    /// Every animal of the ranch, deceased ones included. Unknown ranches
    /// yield an empty list.
    fn animals_in_ranch(&self, ranch_id: &str) -> anyhow::Result<Vec<HerdMember>>;
}

/// Disease workflows run after a case is stored.
pub trait DiseaseResponse: Send + Sync {
    fn initiate_quarantine(&self, record: &DiseaseRecord) -> anyhow::Result<()>;
    fn handle_contagious(&self, record: &DiseaseRecord) -> anyhow::Result<()>;
    fn file_report(&self, record: &DiseaseRecord) -> anyhow::Result<()>;
}
