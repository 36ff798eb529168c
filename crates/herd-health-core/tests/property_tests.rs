//! Property tests over the full manager.

mod common;

use chrono::Duration;
use common::{farm, now, Harness};
use herd_health_core::{ErrorKind, MedicationLine, NewTreatmentPlan, NewVaccination};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_second_dose_rejected_iff_within_window(gap_hours in 0i64..(60 * 24)) {
        let h = Harness::new();
        let first = now() - Duration::days(90);
        let second = first + Duration::hours(gap_hours);

        h.manager
            .record_vaccination(NewVaccination::new("cow-1", "bvd", "BVD", first, farm()), "vet-ana")
            .unwrap();
        let result = h
            .manager
            .record_vaccination(NewVaccination::new("cow-1", "bvd", "BVD", second, farm()), "vet-ana");

        if gap_hours <= 30 * 24 {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::Conflict);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn prop_plan_total_is_sum_of_line_costs(costs in prop::collection::vec(0u32..10_000, 1..6)) {
        let h = Harness::new();
        let lines: Vec<MedicationLine> = costs
            .iter()
            .map(|c| MedicationLine::new("meloxicam", 0.5, f64::from(*c) / 4.0))
            .collect();
        let expected: f64 = lines.iter().map(|l| l.cost).sum();

        let plan = h
            .manager
            .create_treatment_plan(NewTreatmentPlan::new("cow-1", lines), "vet-ana")
            .unwrap();

        prop_assert_eq!(plan.total_cost, expected);
    }
}
