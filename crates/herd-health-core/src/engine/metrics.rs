//! Per-animal health metrics.

use std::sync::Arc;

use crate::error::{HealthError, Result};
use crate::models::{DiseaseStatus, HealthMetrics, Period};
use crate::repository::{
    DateRange, DiseaseQuery, HealthRepository, RecordQuery, TreatmentQuery, VaccinationQuery,
};

pub const RISK_ACTIVE_DISEASES: &str = "active diseases present";
pub const RISK_MULTIPLE_CONSULTATIONS: &str = "multiple medical consultations";
pub const RISK_NO_VACCINATIONS: &str = "no vaccinations on record";

pub const RECOMMEND_VACCINATION: &str = "update vaccination schedule";
pub const RECOMMEND_FOLLOW_UP: &str = "continuous medical follow-up";
pub const RECOMMEND_EVALUATION: &str = "urgent veterinary evaluation";

/// 100, minus 20 per active disease, minus 10 for more than five
/// consultations, clamped to `0..=100`.
pub fn health_score(active_diseases: u32, consultations: u32) -> u8 {
    let mut score = 100i64 - 20 * i64::from(active_diseases);
    if consultations > 5 {
        score -= 10;
    }
    score.clamp(0, 100) as u8
}

pub fn risk_factors(active_diseases: u32, consultations: u32, vaccinations: u32) -> Vec<String> {
    let mut factors = Vec::new();
    if active_diseases > 0 {
        factors.push(RISK_ACTIVE_DISEASES.to_string());
    }
    if consultations > 3 {
        factors.push(RISK_MULTIPLE_CONSULTATIONS.to_string());
    }
    if vaccinations == 0 {
        factors.push(RISK_NO_VACCINATIONS.to_string());
    }
    factors
}

pub fn recommendations(vaccinations: u32, active_diseases: u32, health_score: u8) -> Vec<String> {
    let mut recs = Vec::new();
    if vaccinations == 0 {
        recs.push(RECOMMEND_VACCINATION.to_string());
    }
    if active_diseases > 0 {
        recs.push(RECOMMEND_FOLLOW_UP.to_string());
    }
    if health_score < 70 {
        recs.push(RECOMMEND_EVALUATION.to_string());
    }
    recs
}

/// Read-only aggregation of one animal's activity over a period.
pub struct HealthMetricsCalculator {
    repository: Arc<dyn HealthRepository>,
}

impl HealthMetricsCalculator {
    pub fn new(repository: Arc<dyn HealthRepository>) -> Self {
        Self { repository }
    }

    pub fn compute(&self, bovine_id: &str, period: Period) -> Result<HealthMetrics> {
        if !period.is_valid() {
            return Err(HealthError::invalid_input(
                "calculate_health_metrics",
                "period",
                format!("start {} is after end {}", period.start, period.end),
            ));
        }
        let range = DateRange::from(period);

        let records = self
            .repository
            .find_medical_records(&RecordQuery::for_bovine(bovine_id).within(range))?;
        let treatments = self
            .repository
            .find_treatment_plans(&TreatmentQuery::for_bovine(bovine_id).started(range))?;
        let vaccinations = self
            .repository
            .count_vaccinations(&VaccinationQuery::for_bovine(bovine_id).administered(range))?;
        let active_diseases = self.repository.count_disease_records(
            &DiseaseQuery::for_bovine(bovine_id)
                .with_statuses(&DiseaseStatus::ACTIVE)
                .detected(range),
        )?;

        let consultations = count(records.len());
        let vaccinations = count(vaccinations);
        let active_diseases = count(active_diseases);

        let total_cost = records.iter().map(|r| r.medication_cost()).sum::<f64>()
            + treatments.iter().map(|t| t.total_cost).sum::<f64>();

        let score = health_score(active_diseases, consultations);

        Ok(HealthMetrics {
            bovine_id: bovine_id.to_string(),
            period,
            consultations,
            vaccinations,
            treatments: count(treatments.len()),
            active_diseases,
            total_cost,
            health_score: score,
            risk_factors: risk_factors(active_diseases, consultations, vaccinations),
            recommendations: recommendations(vaccinations, active_diseases, score),
        })
    }
}

pub(crate) fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
