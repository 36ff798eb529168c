//! Medical history query input and result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::disease::DiseaseRecord;
use super::record::MedicalRecord;
use super::treatment::TreatmentPlan;
use super::vaccination::Vaccination;

/// Filters for `get_medical_history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryFilters {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub include_vaccinations: bool,
    pub include_treatments: bool,
    pub include_diseases: bool,
}

impl Default for HistoryFilters {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            include_vaccinations: true,
            include_treatments: true,
            include_diseases: true,
        }
    }
}

impl HistoryFilters {
    /// Restrict every sub-collection to `[start, end]`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }
}

/// Everything on file for one animal, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalHistory {
    pub bovine_id: String,
    pub records: Vec<MedicalRecord>,
    /// `None` when excluded by the filters
    pub vaccinations: Option<Vec<Vaccination>>,
    pub treatments: Option<Vec<TreatmentPlan>>,
    pub diseases: Option<Vec<DiseaseRecord>>,
}

impl MedicalHistory {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
            && self.vaccinations.as_ref().map_or(true, |v| v.is_empty())
            && self.treatments.as_ref().map_or(true, |t| t.is_empty())
            && self.diseases.as_ref().map_or(true, |d| d.is_empty())
    }
}
