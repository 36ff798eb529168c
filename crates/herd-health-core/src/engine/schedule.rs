//! Vaccination due dates and schedule priority.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::clock::add_days;
use crate::config::{EngineConfig, PriorityThresholds, MAX_DAY_SPAN};
use crate::error::{HealthError, Result};
use crate::models::{SchedulePriority, Vaccination, VaccinationScheduleItem};

/// Computes follow-up dates from the vaccine interval table.
///
/// The table is read on every call, so [`set_interval`](Self::set_interval)
/// affects the next vaccination recorded.
pub struct ScheduleCalculator {
    intervals: RwLock<HashMap<String, i64>>,
    default_interval_days: i64,
    thresholds: PriorityThresholds,
}

impl ScheduleCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        let intervals = config
            .vaccine_intervals
            .iter()
            .map(|(id, days)| (normalize(id), *days))
            .collect();

        Self {
            intervals: RwLock::new(intervals),
            default_interval_days: config.default_vaccine_interval_days,
            thresholds: config.priority_thresholds.clone(),
        }
    }

    /// Interval for `vaccine_id`, or the default for unknown vaccines.
    pub fn interval_days(&self, vaccine_id: &str) -> i64 {
        let key = normalize(vaccine_id);
        let configured = match self.intervals.read() {
            Ok(table) => table.get(&key).copied(),
            Err(poisoned) => poisoned.into_inner().get(&key).copied(),
        };
        configured.unwrap_or(self.default_interval_days)
    }

    /// Fails when the due date falls outside the representable range.
    pub fn next_vaccination_due_date(
        &self,
        vaccine_id: &str,
        administration_date: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        add_days(administration_date, self.interval_days(vaccine_id)).ok_or_else(|| {
            HealthError::invalid_input(
                "record_vaccination",
                "administration_date",
                "next due date is out of range",
            )
        })
    }

    /// Replace the interval for one vaccine.
    pub fn set_interval(&self, vaccine_id: &str, days: i64) -> Result<()> {
        if vaccine_id.trim().is_empty() {
            return Err(HealthError::invalid_input(
                "set_vaccine_interval",
                "vaccine_id",
                "must not be empty",
            ));
        }
        if !(1..=MAX_DAY_SPAN).contains(&days) {
            return Err(HealthError::invalid_input(
                "set_vaccine_interval",
                "days",
                format!("must be within 1..={}, got {}", MAX_DAY_SPAN, days),
            ));
        }

        let mut table = match self.intervals.write() {
            Ok(table) => table,
            Err(poisoned) => poisoned.into_inner(),
        };
        table.insert(normalize(vaccine_id), days);
        Ok(())
    }

    pub fn priority(&self, days_until_due: i64) -> SchedulePriority {
        let t = &self.thresholds;
        if days_until_due <= t.urgent_days {
            SchedulePriority::Urgent
        } else if days_until_due <= t.high_days {
            SchedulePriority::High
        } else if days_until_due <= t.medium_days {
            SchedulePriority::Medium
        } else {
            SchedulePriority::Low
        }
    }

    /// Schedule entry for a vaccination's pending follow-up.
    pub fn schedule_item(
        &self,
        vaccination: &Vaccination,
        now: DateTime<Utc>,
    ) -> Option<VaccinationScheduleItem> {
        let scheduled_date = vaccination.next_due_date?;
        let days_until_due = (scheduled_date - now).num_days();

        Some(VaccinationScheduleItem {
            vaccination_id: vaccination.id.clone(),
            bovine_id: vaccination.bovine_id.clone(),
            vaccine_id: vaccination.vaccine_id.clone(),
            vaccine_name: vaccination.vaccine_name.clone(),
            scheduled_date,
            last_administered: vaccination.administration_date,
            days_until_due,
            priority: self.priority(days_until_due),
        })
    }
}

fn normalize(vaccine_id: &str) -> String {
    vaccine_id.trim().to_lowercase()
}

/// Higher priority first, then earlier date.
pub fn sort_schedule(items: &mut [VaccinationScheduleItem]) {
    items.sort_by(|a, b| match b.priority.cmp(&a.priority) {
        Ordering::Equal => a
            .scheduled_date
            .cmp(&b.scheduled_date)
            .then_with(|| a.vaccination_id.cmp(&b.vaccination_id)),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoLocation, VaccinationStatus};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn calculator() -> ScheduleCalculator {
        ScheduleCalculator::new(&EngineConfig::default())
    }

    fn vaccination(id: &str, due: DateTime<Utc>) -> Vaccination {
        Vaccination {
            id: id.into(),
            bovine_id: "cow-1".into(),
            vaccine_id: "fmd".into(),
            vaccine_name: "FMD".into(),
            administration_date: due - Duration::days(180),
            location: GeoLocation::new(0.0, 0.0),
            dose_quantity: 1.0,
            batch_number: None,
            next_due_date: Some(due),
            status: VaccinationStatus::Scheduled,
            recorded_by: "vet-1".into(),
            created_at: due - Duration::days(180),
        }
    }

    #[test]
    fn test_known_and_unknown_intervals() {
        let calc = calculator();
        let given = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();

        assert_eq!(
            calc.next_vaccination_due_date("fmd", given).unwrap(),
            given + Duration::days(180)
        );
        assert_eq!(
            calc.next_vaccination_due_date("FMD", given).unwrap(),
            given + Duration::days(180)
        );
        assert_eq!(
            calc.next_vaccination_due_date("mystery", given).unwrap(),
            given + Duration::days(365)
        );
    }

    #[test]
    fn test_interval_update_applies_to_next_call() {
        let calc = calculator();
        let given = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();

        calc.set_interval("fmd", 90).unwrap();
        assert_eq!(
            calc.next_vaccination_due_date("fmd", given).unwrap(),
            given + Duration::days(90)
        );
        assert!(calc.set_interval("fmd", 0).is_err());
        assert!(calc.set_interval(" ", 10).is_err());
    }

    #[test]
    fn test_interval_beyond_bound_is_rejected() {
        let calc = calculator();
        let given = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();

        for days in [MAX_DAY_SPAN + 1, i64::MAX] {
            let err = calc.set_interval("fmd", days).unwrap_err();
            assert!(matches!(err, HealthError::InvalidInput { field: "days", .. }));
        }
        assert_eq!(
            calc.next_vaccination_due_date("fmd", given).unwrap(),
            given + Duration::days(180)
        );

        calc.set_interval("fmd", MAX_DAY_SPAN).unwrap();
        assert_eq!(
            calc.next_vaccination_due_date("fmd", given).unwrap(),
            given + Duration::days(MAX_DAY_SPAN)
        );
    }

    #[test]
    fn test_due_date_past_calendar_end_is_an_error() {
        let calc = calculator();
        let err = calc
            .next_vaccination_due_date("fmd", DateTime::<Utc>::MAX_UTC)
            .unwrap_err();
        assert!(matches!(
            err,
            HealthError::InvalidInput { field: "administration_date", .. }
        ));
    }

    #[test]
    fn test_priority_thresholds() {
        let calc = calculator();
        assert_eq!(calc.priority(0), SchedulePriority::Urgent);
        assert_eq!(calc.priority(3), SchedulePriority::Urgent);
        assert_eq!(calc.priority(4), SchedulePriority::High);
        assert_eq!(calc.priority(7), SchedulePriority::High);
        assert_eq!(calc.priority(14), SchedulePriority::Medium);
        assert_eq!(calc.priority(15), SchedulePriority::Low);
    }

    #[test]
    fn test_sort_schedule() {
        let calc = calculator();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut items: Vec<_> = [
            ("a", 20),
            ("b", 2),
            ("c", 10),
            ("d", 1),
            ("e", 5),
        ]
        .iter()
        .filter_map(|(id, days)| calc.schedule_item(&vaccination(id, now + Duration::days(*days)), now))
        .collect();

        sort_schedule(&mut items);

        let order: Vec<&str> = items.iter().map(|i| i.vaccination_id.as_str()).collect();
        assert_eq!(order, vec!["d", "b", "e", "c", "a"]);
        assert_eq!(items[0].priority, SchedulePriority::Urgent);
        assert_eq!(items[4].priority, SchedulePriority::Low);
    }

    proptest! {
        #[test]
        fn prop_due_date_is_administration_plus_interval(
            secs in 0i64..4_000_000_000,
            known in prop::sample::select(vec!["fmd", "ibr", "rabies", "clostridial", "unlisted"]),
        ) {
            let calc = calculator();
            let given = Utc.timestamp_opt(secs, 0).unwrap();
            let expected = match known {
                "fmd" | "clostridial" => 180,
                _ => 365,
            };
            prop_assert_eq!(
                calc.next_vaccination_due_date(known, given).unwrap(),
                given + Duration::days(expected)
            );
        }

        #[test]
        fn prop_priority_is_monotonic(a in -30i64..60, b in -30i64..60) {
            let calc = calculator();
            if a <= b {
                prop_assert!(calc.priority(a) >= calc.priority(b));
            }
        }
    }
}
