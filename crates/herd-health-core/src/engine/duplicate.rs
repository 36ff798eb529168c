//! Repeated-vaccination detection.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::add_days;
use crate::error::{HealthError, Result};
use crate::models::Vaccination;
use crate::repository::{DateRange, HealthRepository, SortOrder, VaccinationQuery};

/// Flags a vaccination when the same vaccine was given to the same animal
/// within the lookback window.
pub struct DuplicateDetector {
    repository: Arc<dyn HealthRepository>,
    window_days: i64,
}

impl DuplicateDetector {
    pub fn new(repository: Arc<dyn HealthRepository>, window_days: i64) -> Self {
        Self {
            repository,
            window_days,
        }
    }

    /// `[administration_date - window, administration_date]`, both ends
    /// included.
    pub fn window(&self, administration_date: DateTime<Utc>) -> Result<DateRange> {
        let start = add_days(administration_date, -self.window_days).ok_or_else(|| {
            HealthError::invalid_input(
                "record_vaccination",
                "administration_date",
                "duplicate window start is out of range",
            )
        })?;
        Ok(DateRange::between(start, administration_date))
    }

    pub fn is_duplicate(
        &self,
        bovine_id: &str,
        vaccine_id: &str,
        administration_date: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self
            .find_conflict(bovine_id, vaccine_id, administration_date)?
            .is_some())
    }

    /// Most recent vaccination inside the window, if any.
    pub fn find_conflict(
        &self,
        bovine_id: &str,
        vaccine_id: &str,
        administration_date: DateTime<Utc>,
    ) -> Result<Option<Vaccination>> {
        let mut query = VaccinationQuery::for_bovine(bovine_id)
            .vaccine(vaccine_id)
            .administered(self.window(administration_date)?);
        query.order = SortOrder::Descending;

        Ok(self.repository.find_vaccinations(&query)?.into_iter().next())
    }
}
