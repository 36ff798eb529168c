//! Derived health indicators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive time window `[start, end]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` days leading up to and including `end`, or `None` when
    /// the start falls outside the representable range.
    pub fn trailing_days(end: DateTime<Utc>, days: i64) -> Option<Self> {
        let start = crate::clock::add_days(end, days.checked_neg()?)?;
        Some(Self { start, end })
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// Per-animal health summary for a period. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthMetrics {
    pub bovine_id: String,
    pub period: Period,
    pub consultations: u32,
    pub vaccinations: u32,
    pub treatments: u32,
    pub active_diseases: u32,
    pub total_cost: f64,
    /// Always within 0..=100
    pub health_score: u8,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Ranch-level rollup over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatistics {
    pub ranch_id: String,
    pub period: Period,
    pub total_animals: u32,
    pub total_consultations: u32,
    pub total_vaccinations: u32,
    pub total_treatments: u32,
    pub total_disease_cases: u32,
    pub active_disease_cases: u32,
    /// Percentage of live animals vaccinated in the window
    pub vaccination_coverage: f64,
    /// Percentage of window treatment plans that completed
    pub treatment_success_rate: f64,
    /// Percentage of window disease cases that ended in death
    pub mortality_rate: f64,
    pub total_cost: f64,
    pub open_alerts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_validity() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();

        assert!(Period::new(start, end).is_valid());
        assert!(Period::new(start, start).is_valid());
        assert!(!Period::new(end, start).is_valid());
    }

    #[test]
    fn test_trailing_days() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let period = Period::trailing_days(end, 30).unwrap();
        assert_eq!(period.start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(period.end, end);
    }

    #[test]
    fn test_trailing_days_out_of_range() {
        let end = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        assert!(Period::trailing_days(end, i64::MAX).is_none());
        assert!(Period::trailing_days(end, i64::MIN).is_none());
        assert!(Period::trailing_days(DateTime::<Utc>::MIN_UTC, 1).is_none());
    }
}
