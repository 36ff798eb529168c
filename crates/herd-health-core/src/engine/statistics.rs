//! Ranch-level rollups.

use std::collections::HashSet;
use std::sync::Arc;

use super::metrics::count;
use crate::error::Result;
use crate::models::{DiseaseStatus, HealthStatistics, Period, TreatmentStatus};
use crate::ports::HerdMember;
use crate::repository::{
    AlertQuery, DateRange, DiseaseQuery, HealthRepository, RecordQuery, TreatmentQuery,
    VaccinationQuery,
};

/// `part / whole` as a percentage; an empty whole yields 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

pub struct StatisticsCalculator {
    repository: Arc<dyn HealthRepository>,
}

impl StatisticsCalculator {
    pub fn new(repository: Arc<dyn HealthRepository>) -> Self {
        Self { repository }
    }

    /// Aggregate the given herd over `period`.
    pub fn compute(
        &self,
        ranch_id: &str,
        herd: &[HerdMember],
        period: Period,
    ) -> Result<HealthStatistics> {
        let ids: Vec<String> = herd.iter().map(|m| m.bovine_id.clone()).collect();
        let range = DateRange::from(period);

        let records = self
            .repository
            .find_medical_records(&RecordQuery::for_bovines(&ids).within(range))?;
        let vaccinations = self
            .repository
            .find_vaccinations(&VaccinationQuery::for_bovines(&ids).administered(range))?;
        let treatments = self
            .repository
            .find_treatment_plans(&TreatmentQuery::for_bovines(&ids).started(range))?;
        let diseases = self
            .repository
            .find_disease_records(&DiseaseQuery::for_bovines(&ids).detected(range))?;
        let open_alerts = self
            .repository
            .find_alerts(&AlertQuery::for_bovines(&ids))?
            .len();

        let vaccinated: HashSet<&str> = vaccinations.iter().map(|v| v.bovine_id.as_str()).collect();
        let living: Vec<&HerdMember> = herd.iter().filter(|m| !m.deceased).collect();
        let living_vaccinated = living
            .iter()
            .filter(|m| vaccinated.contains(m.bovine_id.as_str()))
            .count();

        let completed = treatments
            .iter()
            .filter(|t| t.status == TreatmentStatus::Completed)
            .count();
        let active_cases = diseases.iter().filter(|d| d.status.is_active()).count();
        let deaths = diseases
            .iter()
            .filter(|d| d.status == DiseaseStatus::Deceased)
            .count();

        let total_cost = records.iter().map(|r| r.medication_cost()).sum::<f64>()
            + treatments.iter().map(|t| t.total_cost).sum::<f64>();

        Ok(HealthStatistics {
            ranch_id: ranch_id.to_string(),
            period,
            total_animals: count(herd.len()),
            total_consultations: count(records.len()),
            total_vaccinations: count(vaccinations.len()),
            total_treatments: count(treatments.len()),
            total_disease_cases: count(diseases.len()),
            active_disease_cases: count(active_cases),
            vaccination_coverage: percentage(living_vaccinated, living.len()),
            treatment_success_rate: percentage(completed, treatments.len()),
            mortality_rate: percentage(deaths, diseases.len()),
            total_cost,
            open_alerts: count(open_alerts),
        })
    }
}
