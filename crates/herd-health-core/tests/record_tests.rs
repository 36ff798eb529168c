//! Record creation flows through the manager.

mod common;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{farm, now, FakeDiseaseResponse, FakeGeo, FakeHerd, FakeInventory, Harness};
use herd_health_core::engine::AlertDraft;
use herd_health_core::repository::{DiseaseQuery, TreatmentQuery};
use herd_health_core::{
    AlertSeverity, AlertType, ConsultationType, DiseaseSeverity, DiseaseStatus, EngineEvent,
    ErrorKind, GeoLocation, HealthError, HealthRecordManager, HealthRepository, MedicationLine,
    NewDiseaseRecord, NewMedicalRecord, NewTreatmentPlan, NewVaccination, RecordKind,
    SqliteHealthStore, TreatmentStatus, VaccinationStatus, MAX_DAY_SPAN,
};

fn vaccination(bovine: &str, vaccine: &str, days_ago: i64) -> NewVaccination {
    NewVaccination::new(
        bovine,
        vaccine,
        vaccine.to_uppercase(),
        now() - Duration::days(days_ago),
        farm(),
    )
}

// =========================================================================
// Medical records
// =========================================================================

#[test]
fn test_medical_record_with_medications() {
    let h = Harness::new();
    let mut data = NewMedicalRecord::new("cow-1", ConsultationType::Routine, now());
    data.diagnosis = Some("mild lameness".into());
    data.location = Some(farm());
    data.medications = vec![
        MedicationLine::new("meloxicam", 2.5, 30.0),
        MedicationLine::new("oxytetracycline", 10.0, 45.0),
    ];

    let record = h.manager.create_medical_record(data, "vet-ana").unwrap();

    assert_eq!(record.id, "rec_000001");
    assert_eq!(record.recorded_by, "vet-ana");
    assert_eq!(record.medications.len(), 2);
    assert!(record.medications.iter().all(|m| m.health_record_id == record.id));
    assert_eq!(record.medication_cost(), 75.0);

    let stored = h.manager.get_medical_record(&record.id).unwrap();
    assert_eq!(stored, record);

    let confirmations = h.notifier.confirmations.lock().unwrap();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].kind, RecordKind::MedicalRecord);
    assert_eq!(confirmations[0].record_id, record.id);
}

#[test]
fn test_medical_record_rejects_latitude_91() {
    let h = Harness::new();
    let mut data = NewMedicalRecord::new("cow-1", ConsultationType::Routine, now());
    data.location = Some(GeoLocation::new(91.0, 0.0));

    let err = h.manager.create_medical_record(data, "vet-ana").unwrap_err();

    assert!(matches!(err, HealthError::InvalidLocation { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.events.rejections(), 1);
    let history = h.manager.get_medical_history("cow-1", &Default::default()).unwrap();
    assert!(history.is_empty());
}

#[test]
fn test_medical_record_without_location_skips_location_check() {
    let h = Harness::new();
    let data = NewMedicalRecord::new("cow-1", ConsultationType::FollowUp, now());
    assert!(h.manager.create_medical_record(data, "vet-ana").is_ok());
}

#[test]
fn test_medical_record_rejects_bad_dosage() {
    let h = Harness::new();
    let mut data = NewMedicalRecord::new("cow-1", ConsultationType::Routine, now());
    data.medications = vec![MedicationLine::new("meloxicam", -1.0, 30.0)];

    let err = h.manager.create_medical_record(data, "vet-ana").unwrap_err();
    assert!(matches!(
        err,
        HealthError::InvalidMedicationDosage { ref medication_id, .. } if medication_id == "meloxicam"
    ));
}

#[test]
fn test_emergency_consultation_raises_alert() {
    let h = Harness::new();
    let data = NewMedicalRecord::new("cow-2", ConsultationType::Emergency, now());
    let record = h.manager.create_medical_record(data, "vet-ana").unwrap();

    let alerts = h.manager.list_alerts("ranch-1", false).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::EmergencyConsultation);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert_eq!(alerts[0].related_record_id, record.id);
    assert!(alerts[0].notification_sent);
    assert_eq!(h.notifier.sent_alerts(), vec![alerts[0].id.clone()]);
}

#[test]
fn test_surgery_schedules_post_surgery_check() {
    let h = Harness::new();
    let data = NewMedicalRecord::new("cow-2", ConsultationType::Surgery, now());
    h.manager.create_medical_record(data, "vet-ana").unwrap();

    let alerts = h.manager.list_alerts("ranch-1", false).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::PostSurgeryCheck);
    assert_eq!(alerts[0].severity, AlertSeverity::Medium);
    assert_eq!(alerts[0].due_date, Some(now() + Duration::days(7)));
}

#[test]
fn test_notification_failure_does_not_fail_record() {
    let h = Harness::new();
    h.notifier.set_failing(true);

    let data = NewMedicalRecord::new("cow-2", ConsultationType::Emergency, now());
    let record = h.manager.create_medical_record(data, "vet-ana").unwrap();

    assert!(h.manager.get_medical_record(&record.id).is_ok());
    let alerts = h.manager.list_alerts("ranch-1", false).unwrap();
    assert!(!alerts[0].notification_sent);
    // Alert dispatch and confirmation both failed
    assert_eq!(h.events.dependency_failures().len(), 2);
}

#[test]
fn test_geolocator_fills_missing_address() {
    let store = Arc::new(SqliteHealthStore::open_in_memory().unwrap());
    let manager = HealthRecordManager::builder(
        store,
        Arc::new(common::FakeNotifier::default()),
        Arc::new(FakeInventory::default()),
        Arc::new(FakeHerd::default()),
    )
    .with_geolocator(Arc::new(FakeGeo))
    .build();

    let mut data = NewMedicalRecord::new("cow-1", ConsultationType::Routine, now());
    data.location = Some(farm());
    let record = manager.create_medical_record(data, "vet-ana").unwrap();

    assert_eq!(
        record.location.and_then(|l| l.address).as_deref(),
        Some("Paddock 4, Estancia La Paz")
    );
}

#[test]
fn test_surgery_check_past_calendar_end_is_rejected() {
    let h = Harness::new();
    let data = NewMedicalRecord::new("cow-1", ConsultationType::Surgery, DateTime::<Utc>::MAX_UTC);

    let err = h.manager.create_medical_record(data, "vet-ana").unwrap_err();

    assert!(matches!(err, HealthError::InvalidInput { field: "consultation_date", .. }));
    assert_eq!(h.events.rejections(), 1);
    let history = h.manager.get_medical_history("cow-1", &Default::default()).unwrap();
    assert!(history.is_empty());
}

#[test]
fn test_sub_millisecond_consultation_date_is_kept() {
    let h = Harness::new();
    let at = now() + Duration::nanoseconds(123_456_789);
    let data = NewMedicalRecord::new("cow-1", ConsultationType::Routine, at);

    let record = h.manager.create_medical_record(data, "vet-ana").unwrap();

    assert_eq!(record.consultation_date, at);
    assert_eq!(h.manager.get_medical_record(&record.id).unwrap(), record);
}

#[test]
fn test_unknown_ids_are_not_found() {
    let h = Harness::new();
    for err in [
        h.manager.get_medical_record("rec_missing").unwrap_err(),
        h.manager.get_vaccination("vac_missing").unwrap_err(),
        h.manager.get_treatment_plan("trt_missing").unwrap_err(),
        h.manager.get_disease_record("dis_missing").unwrap_err(),
        h.manager.get_alert("alt_missing").unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

// =========================================================================
// Vaccinations
// =========================================================================

#[test]
fn test_vaccination_gets_due_date_and_side_effects() {
    let h = Harness::new();
    let recorded = h
        .manager
        .record_vaccination(vaccination("cow-1", "fmd", 0), "vet-ana")
        .unwrap();

    assert_eq!(recorded.status, VaccinationStatus::Scheduled);
    assert_eq!(recorded.next_due_date, Some(now() + Duration::days(180)));
    assert_eq!(
        *h.notifier.reminders.lock().unwrap(),
        vec![(recorded.id.clone(), now() + Duration::days(180))]
    );
    assert_eq!(
        *h.inventory.consumed.lock().unwrap(),
        vec![("fmd".to_string(), 1.0)]
    );
    assert_eq!(h.notifier.confirmations.lock().unwrap()[0].kind, RecordKind::Vaccination);
}

#[test]
fn test_unknown_vaccine_defaults_to_a_year() {
    let h = Harness::new();
    let recorded = h
        .manager
        .record_vaccination(vaccination("cow-1", "brucellosis", 0), "vet-ana")
        .unwrap();
    assert_eq!(recorded.next_due_date, Some(now() + Duration::days(365)));
}

#[test]
fn test_vaccination_rejects_latitude_91() {
    let h = Harness::new();
    let mut data = vaccination("cow-1", "fmd", 0);
    data.location = GeoLocation::new(91.0, 0.0);

    let err = h.manager.record_vaccination(data, "vet-ana").unwrap_err();
    assert!(matches!(err, HealthError::InvalidLocation { .. }));
    assert!(h.inventory.consumed.lock().unwrap().is_empty());
}

#[test]
fn test_duplicate_window_edges() {
    let h = Harness::new();
    h.manager
        .record_vaccination(vaccination("cow-1", "fmd", 61), "vet-ana")
        .unwrap();

    // Exactly 30 days later is still a duplicate
    let err = h
        .manager
        .record_vaccination(vaccination("cow-1", "fmd", 31), "vet-ana")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("cow-1"));
    assert!(err.to_string().contains("fmd"));

    // 31 days later is fine
    h.manager
        .record_vaccination(vaccination("cow-1", "fmd", 30), "vet-ana")
        .unwrap();

    // Other animals and other vaccines are unaffected
    h.manager
        .record_vaccination(vaccination("cow-2", "fmd", 30), "vet-ana")
        .unwrap();
    h.manager
        .record_vaccination(vaccination("cow-1", "ibr", 30), "vet-ana")
        .unwrap();
}

#[test]
fn test_dose_just_past_window_is_accepted() {
    let h = Harness::new();
    let first = now() - Duration::days(40);
    h.manager
        .record_vaccination(
            NewVaccination::new("cow-1", "bvd", "BVD", first, farm()),
            "vet-ana",
        )
        .unwrap();

    let later = first + Duration::days(30) + Duration::microseconds(500);
    let second = h
        .manager
        .record_vaccination(
            NewVaccination::new("cow-1", "bvd", "BVD", later, farm()),
            "vet-ana",
        )
        .unwrap();

    assert_eq!(second.administration_date, later);
    assert_eq!(h.manager.get_vaccination(&second.id).unwrap(), second);
}

#[test]
fn test_new_dose_completes_earlier_follow_up() {
    let h = Harness::new();
    let first = h
        .manager
        .record_vaccination(vaccination("cow-1", "fmd", 200), "vet-ana")
        .unwrap();
    let second = h
        .manager
        .record_vaccination(vaccination("cow-1", "fmd", 10), "vet-ana")
        .unwrap();

    assert_eq!(
        h.manager.get_vaccination(&first.id).unwrap().status,
        VaccinationStatus::Completed
    );
    assert_eq!(
        h.manager.get_vaccination(&second.id).unwrap().status,
        VaccinationStatus::Scheduled
    );
}

#[test]
fn test_interval_update_applies_to_later_vaccinations() {
    let h = Harness::new();
    h.manager.set_vaccine_interval("fmd", 90).unwrap();

    let recorded = h
        .manager
        .record_vaccination(vaccination("cow-1", "fmd", 0), "vet-ana")
        .unwrap();
    assert_eq!(recorded.next_due_date, Some(now() + Duration::days(90)));

    let err = h.manager.set_vaccine_interval("fmd", -5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_oversized_interval_is_rejected() {
    let h = Harness::new();
    for days in [MAX_DAY_SPAN + 1, i64::MAX] {
        let err = h.manager.set_vaccine_interval("fmd", days).unwrap_err();
        assert!(matches!(err, HealthError::InvalidInput { field: "days", .. }));
    }

    // The table is untouched, so later doses still get the configured interval
    let recorded = h
        .manager
        .record_vaccination(vaccination("cow-1", "fmd", 0), "vet-ana")
        .unwrap();
    assert_eq!(recorded.next_due_date, Some(now() + Duration::days(180)));
}

#[test]
fn test_vaccination_due_past_calendar_end_is_rejected() {
    let h = Harness::new();
    let data = NewVaccination::new("cow-1", "fmd", "FMD", DateTime::<Utc>::MAX_UTC, farm());

    let err = h.manager.record_vaccination(data, "vet-ana").unwrap_err();

    assert!(matches!(err, HealthError::InvalidInput { field: "administration_date", .. }));
    assert!(h.inventory.consumed.lock().unwrap().is_empty());
    let history = h.manager.get_medical_history("cow-1", &Default::default()).unwrap();
    assert!(history.vaccinations.unwrap_or_default().is_empty());
}

#[test]
fn test_concurrent_duplicate_vaccinations_admit_one() {
    let h = Harness::new();
    let manager = &h.manager;

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(move || manager.record_vaccination(vaccination("cow-3", "ibr", 1), "vet-ana")))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, HealthError::DuplicateVaccination { .. })));
    assert_eq!(h.inventory.consumed.lock().unwrap().len(), 1);
}

// =========================================================================
// Treatment plans
// =========================================================================

#[test]
fn test_treatment_plan_totals_and_reserves() {
    let h = Harness::new();
    let mut data = NewTreatmentPlan::new(
        "cow-2",
        vec![
            MedicationLine::new("oxytetracycline", 20.0, 100.0),
            MedicationLine::new("meloxicam", 5.0, 50.0),
        ],
    );
    data.diagnosis = Some("pneumonia".into());

    let plan = h.manager.create_treatment_plan(data, "vet-ana").unwrap();

    assert_eq!(plan.total_cost, 150.0);
    assert_eq!(plan.status, TreatmentStatus::Active);
    assert_eq!(plan.start_date, now());
    assert_eq!(h.inventory.reserved("oxytetracycline"), 20.0);
    assert_eq!(h.inventory.reserved("meloxicam"), 5.0);
    assert_eq!(h.manager.get_treatment_plan(&plan.id).unwrap(), plan);
}

#[test]
fn test_unavailable_line_aborts_whole_plan() {
    let h = Harness::new();
    let data = NewTreatmentPlan::new(
        "cow-2",
        vec![
            MedicationLine::new("oxytetracycline", 20.0, 100.0),
            MedicationLine::new("penicillin", 50.0, 50.0),
        ],
    );

    let err = h.manager.create_treatment_plan(data, "vet-ana").unwrap_err();

    assert!(matches!(
        err,
        HealthError::MedicationUnavailable { ref medication_id, .. } if medication_id == "penicillin"
    ));
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert_eq!(h.inventory.total_reserved(), 0.0);
    assert_eq!(
        h.store
            .count_treatment_plans(&TreatmentQuery::for_bovine("cow-2"))
            .unwrap(),
        0
    );
}

#[test]
fn test_failed_reservation_releases_earlier_lines() {
    let inventory = FakeInventory::with_stock(&[("oxytetracycline", 500.0), ("meloxicam", 100.0)]);
    inventory
        .reserve_fails
        .lock()
        .unwrap()
        .push("meloxicam".to_string());
    let h = Harness::with_parts(inventory, FakeHerd::default(), FakeDiseaseResponse::default());

    let data = NewTreatmentPlan::new(
        "cow-2",
        vec![
            MedicationLine::new("oxytetracycline", 20.0, 100.0),
            MedicationLine::new("meloxicam", 5.0, 50.0),
        ],
    );
    let err = h.manager.create_treatment_plan(data, "vet-ana").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert_eq!(h.inventory.reserved("oxytetracycline"), 0.0);
    assert_eq!(
        h.store
            .count_treatment_plans(&TreatmentQuery::for_bovine("cow-2"))
            .unwrap(),
        0
    );
}

#[test]
fn test_future_plan_is_planned_with_follow_up() {
    let h = Harness::new();
    let mut data = NewTreatmentPlan::new("cow-1", vec![MedicationLine::new("meloxicam", 1.0, 10.0)]);
    data.start_date = Some(now() + Duration::days(2));
    data.next_checkup = Some(now() + Duration::days(9));

    let plan = h.manager.create_treatment_plan(data, "vet-ana").unwrap();
    assert_eq!(plan.status, TreatmentStatus::Planned);

    let alerts = h.manager.list_alerts("ranch-1", false).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::TreatmentFollowUp);
    assert_eq!(alerts[0].due_date, Some(now() + Duration::days(9)));
}

#[test]
fn test_checkup_before_start_is_rejected() {
    let h = Harness::new();
    let mut data = NewTreatmentPlan::new("cow-1", vec![MedicationLine::new("meloxicam", 1.0, 10.0)]);
    data.next_checkup = Some(now() - Duration::days(1));

    let err = h.manager.create_treatment_plan(data, "vet-ana").unwrap_err();
    assert!(matches!(err, HealthError::InvalidInput { field: "next_checkup", .. }));
    assert_eq!(h.inventory.total_reserved(), 0.0);
}

// =========================================================================
// Disease records
// =========================================================================

#[test]
fn test_disease_workflows_and_quarantine_default() {
    let h = Harness::new();
    let mut data = NewDiseaseRecord::new("cow-3", "foot-and-mouth", DiseaseSeverity::Severe, now());
    data.is_contagious = true;
    data.is_reportable = true;
    data.quarantine_required = true;

    let record = h.manager.record_disease(data, "vet-ana").unwrap();

    assert_eq!(record.quarantine_end_date, Some(now() + Duration::days(21)));
    let calls = h.disease_response.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            ("quarantine", record.id.clone()),
            ("contagious", record.id.clone()),
            ("report", record.id.clone()),
        ]
    );
    // Severe is not critical
    assert!(h.manager.list_alerts("ranch-1", false).unwrap().is_empty());
}

#[test]
fn test_quarantine_past_calendar_end_is_rejected() {
    let h = Harness::new();
    let mut data = NewDiseaseRecord::new(
        "cow-3",
        "foot-and-mouth",
        DiseaseSeverity::Severe,
        DateTime::<Utc>::MAX_UTC,
    );
    data.quarantine_required = true;

    let err = h.manager.record_disease(data, "vet-ana").unwrap_err();

    assert!(matches!(err, HealthError::InvalidInput { field: "detection_date", .. }));
    assert!(h.disease_response.calls.lock().unwrap().is_empty());
}

#[test]
fn test_failing_workflow_is_isolated() {
    let response = FakeDiseaseResponse {
        fail_quarantine: true,
        ..Default::default()
    };
    let h = Harness::with_parts(FakeInventory::default(), FakeHerd::default(), response);

    let mut data = NewDiseaseRecord::new("cow-3", "anthrax", DiseaseSeverity::Moderate, now());
    data.quarantine_required = true;
    data.is_reportable = true;

    let record = h.manager.record_disease(data, "vet-ana").unwrap();

    assert!(h.manager.get_disease_record(&record.id).is_ok());
    assert_eq!(
        *h.disease_response.calls.lock().unwrap(),
        vec![("report", record.id.clone())]
    );
    assert!(h.events.dependency_failures().iter().any(|e| matches!(
        e,
        EngineEvent::DependencyFailed { operation: "initiate_quarantine", .. }
    )));
}

#[test]
fn test_critical_disease_raises_alert_immediately() {
    let h = Harness::new();
    let data = NewDiseaseRecord::new("cow-1", "bloat", DiseaseSeverity::Critical, now());
    let record = h.manager.record_disease(data, "vet-ana").unwrap();

    let alerts = h.manager.list_alerts("ranch-1", false).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::HealthDeterioration);
    assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    assert_eq!(alerts[0].related_record_id, record.id);
    assert_eq!(
        h.store
            .count_disease_records(
                &DiseaseQuery::for_bovine("cow-1").with_statuses(&[DiseaseStatus::Confirmed])
            )
            .unwrap(),
        1
    );
}

#[test]
fn test_alert_draft_keeps_record_link() {
    let h = Harness::new();
    let data = NewDiseaseRecord::new("cow-1", "bloat", DiseaseSeverity::Critical, now());
    let record = h.manager.record_disease(data, "vet-ana").unwrap();

    let draft = AlertDraft::health_deterioration(&record);
    assert_eq!(draft.related_record_id, record.id);
    assert_eq!(draft.actions, vec!["isolate animal", "contact veterinarian immediately"]);
}
