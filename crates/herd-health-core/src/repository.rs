//! Storage port.
//!
//! The engine talks to persistence only through [`HealthRepository`]. Queries
//! are limited to what any backing store can offer: date-range filters,
//! status-set filters, an animal-id set and a sort direction on the entity's
//! natural date.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    DiseaseRecord, DiseaseStatus, HealthAlert, MedicalRecord, Medication, Period,
    TreatmentPlan, TreatmentStatus, Vaccination, VaccinationStatus,
};

/// Backend-agnostic storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored data is invalid: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Inclusive, optionally open-ended date filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn up_to(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }
}

impl From<Period> for DateRange {
    fn from(period: Period) -> Self {
        Self::between(period.start, period.end)
    }
}

/// Sort direction on the entity's natural date field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Medical record filter; sorted on `consultation_date`.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    /// `None` means every animal
    pub bovine_ids: Option<Vec<String>>,
    pub consultation_date: DateRange,
    pub order: SortOrder,
}

impl RecordQuery {
    pub fn for_bovine(bovine_id: &str) -> Self {
        Self {
            bovine_ids: Some(vec![bovine_id.to_string()]),
            ..Self::default()
        }
    }

    pub fn for_bovines(bovine_ids: &[String]) -> Self {
        Self {
            bovine_ids: Some(bovine_ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn within(mut self, range: DateRange) -> Self {
        self.consultation_date = range;
        self
    }
}

/// Vaccination filter; sorted on `administration_date`.
#[derive(Debug, Clone, Default)]
pub struct VaccinationQuery {
    pub bovine_ids: Option<Vec<String>>,
    pub vaccine_id: Option<String>,
    pub statuses: Option<Vec<VaccinationStatus>>,
    pub administration_date: DateRange,
    pub next_due_date: DateRange,
    pub order: SortOrder,
}

impl VaccinationQuery {
    pub fn for_bovine(bovine_id: &str) -> Self {
        Self {
            bovine_ids: Some(vec![bovine_id.to_string()]),
            ..Self::default()
        }
    }

    pub fn for_bovines(bovine_ids: &[String]) -> Self {
        Self {
            bovine_ids: Some(bovine_ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn vaccine(mut self, vaccine_id: &str) -> Self {
        self.vaccine_id = Some(vaccine_id.to_string());
        self
    }

    pub fn with_statuses(mut self, statuses: &[VaccinationStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn administered(mut self, range: DateRange) -> Self {
        self.administration_date = range;
        self
    }

    pub fn due(mut self, range: DateRange) -> Self {
        self.next_due_date = range;
        self
    }
}

/// Treatment plan filter; sorted on `start_date`.
#[derive(Debug, Clone, Default)]
pub struct TreatmentQuery {
    pub bovine_ids: Option<Vec<String>>,
    pub statuses: Option<Vec<TreatmentStatus>>,
    pub start_date: DateRange,
    pub next_checkup: DateRange,
    pub order: SortOrder,
}

impl TreatmentQuery {
    pub fn for_bovine(bovine_id: &str) -> Self {
        Self {
            bovine_ids: Some(vec![bovine_id.to_string()]),
            ..Self::default()
        }
    }

    pub fn for_bovines(bovine_ids: &[String]) -> Self {
        Self {
            bovine_ids: Some(bovine_ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn with_statuses(mut self, statuses: &[TreatmentStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn started(mut self, range: DateRange) -> Self {
        self.start_date = range;
        self
    }

    pub fn checkup(mut self, range: DateRange) -> Self {
        self.next_checkup = range;
        self
    }
}

/// Disease case filter; sorted on `detection_date`.
#[derive(Debug, Clone, Default)]
pub struct DiseaseQuery {
    pub bovine_ids: Option<Vec<String>>,
    pub statuses: Option<Vec<DiseaseStatus>>,
    pub detection_date: DateRange,
    pub order: SortOrder,
}

impl DiseaseQuery {
    pub fn for_bovine(bovine_id: &str) -> Self {
        Self {
            bovine_ids: Some(vec![bovine_id.to_string()]),
            ..Self::default()
        }
    }

    pub fn for_bovines(bovine_ids: &[String]) -> Self {
        Self {
            bovine_ids: Some(bovine_ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn with_statuses(mut self, statuses: &[DiseaseStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn detected(mut self, range: DateRange) -> Self {
        self.detection_date = range;
        self
    }
}

/// Alert filter; sorted on `trigger_date`.
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub bovine_ids: Option<Vec<String>>,
    pub include_resolved: bool,
    /// Only unresolved alerts whose notification has not gone out
    pub pending_notification: bool,
    pub order: SortOrder,
}

impl AlertQuery {
    pub fn for_bovines(bovine_ids: &[String]) -> Self {
        Self {
            bovine_ids: Some(bovine_ids.to_vec()),
            ..Self::default()
        }
    }

    pub fn include_resolved(mut self, include: bool) -> Self {
        self.include_resolved = include;
        self
    }

    pub fn pending_notification(mut self) -> Self {
        self.pending_notification = true;
        self
    }
}

/// Outcome of the atomic duplicate-checked vaccination insert.
#[derive(Debug, Clone, PartialEq)]
pub enum VaccinationInsert {
    Inserted,
    /// A vaccination of the same vaccine for the same animal already falls in
    /// the lookback window; nothing was written.
    Duplicate {
        existing_id: String,
        administration_date: DateTime<Utc>,
    },
}

/// Persistence contract for every entity the engine produces.
///
/// Implementations must be safe to share between threads. Nothing is ever
/// deleted through this trait.
pub trait HealthRepository: Send + Sync {
    // Medical records
    fn insert_medical_record(&self, record: &MedicalRecord) -> StorageResult<()>;
    fn insert_record_medication(&self, medication: &Medication) -> StorageResult<()>;
    fn get_medical_record(&self, id: &str) -> StorageResult<Option<MedicalRecord>>;
    fn find_medical_records(&self, query: &RecordQuery) -> StorageResult<Vec<MedicalRecord>>;

    // Vaccinations
    /// Insert unless a vaccination with the same animal and vaccine was
    /// administered inside `lookback`. The check and the insert must be one
    /// atomic step.
    fn insert_vaccination_unique(
        &self,
        vaccination: &Vaccination,
        lookback: &DateRange,
    ) -> StorageResult<VaccinationInsert>;
    fn get_vaccination(&self, id: &str) -> StorageResult<Option<Vaccination>>;
    fn find_vaccinations(&self, query: &VaccinationQuery) -> StorageResult<Vec<Vaccination>>;
    fn count_vaccinations(&self, query: &VaccinationQuery) -> StorageResult<usize>;
    fn update_vaccination_status(&self, id: &str, status: VaccinationStatus)
        -> StorageResult<bool>;

    // Treatment plans
    fn insert_treatment_plan(&self, plan: &TreatmentPlan) -> StorageResult<()>;
    fn get_treatment_plan(&self, id: &str) -> StorageResult<Option<TreatmentPlan>>;
    fn find_treatment_plans(&self, query: &TreatmentQuery) -> StorageResult<Vec<TreatmentPlan>>;
    fn count_treatment_plans(&self, query: &TreatmentQuery) -> StorageResult<usize>;

    // Disease records
    fn insert_disease_record(&self, record: &DiseaseRecord) -> StorageResult<()>;
    fn get_disease_record(&self, id: &str) -> StorageResult<Option<DiseaseRecord>>;
    fn find_disease_records(&self, query: &DiseaseQuery) -> StorageResult<Vec<DiseaseRecord>>;
    fn count_disease_records(&self, query: &DiseaseQuery) -> StorageResult<usize>;

    // Alerts
    /// Insert unless an alert with the same dedupe key exists. Returns whether
    /// a row was written.
    fn insert_alert(&self, alert: &HealthAlert) -> StorageResult<bool>;
    fn get_alert(&self, id: &str) -> StorageResult<Option<HealthAlert>>;
    fn find_alerts(&self, query: &AlertQuery) -> StorageResult<Vec<HealthAlert>>;
    /// Set `notification_sent`; never clears it.
    fn mark_alert_notified(&self, id: &str) -> StorageResult<bool>;
    /// Set `is_resolved`; never clears it.
    fn resolve_alert(&self, id: &str) -> StorageResult<bool>;
}
