//! Engine error type.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::repository::StorageError;

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    ResourceUnavailable,
    NotFound,
    Storage,
}

/// Errors returned by [`HealthRecordManager`](crate::HealthRecordManager).
///
/// Collaborator failures (notifications, inventory consumption, disease
/// workflows) are never surfaced here; they are reported as events.
#[derive(Error, Debug)]
pub enum HealthError {
    #[error("{operation}: invalid location ({latitude}, {longitude}) for bovine {bovine_id}")]
    InvalidLocation {
        operation: &'static str,
        bovine_id: String,
        latitude: f64,
        longitude: f64,
    },

    #[error(
        "{operation}: invalid medication {medication_id} for bovine {bovine_id} (dosage {dosage}, cost {cost})"
    )]
    InvalidMedicationDosage {
        operation: &'static str,
        bovine_id: String,
        medication_id: String,
        dosage: f64,
        cost: f64,
    },

    #[error("{operation}: invalid {field}: {reason}")]
    InvalidInput {
        operation: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("Vaccine {vaccine_id} already administered to bovine {bovine_id} at {administration_date}")]
    DuplicateVaccination {
        bovine_id: String,
        vaccine_id: String,
        administration_date: DateTime<Utc>,
    },

    #[error("Medication {medication_id} unavailable for bovine {bovine_id} (quantity {quantity})")]
    MedicationUnavailable {
        bovine_id: String,
        medication_id: String,
        quantity: f64,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl HealthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HealthError::InvalidLocation { .. }
            | HealthError::InvalidMedicationDosage { .. }
            | HealthError::InvalidInput { .. } => ErrorKind::Validation,
            HealthError::DuplicateVaccination { .. } => ErrorKind::Conflict,
            HealthError::MedicationUnavailable { .. } => ErrorKind::ResourceUnavailable,
            HealthError::NotFound { .. } => ErrorKind::NotFound,
            HealthError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn invalid_input(
        operation: &'static str,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        HealthError::InvalidInput {
            operation,
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HealthError>;
