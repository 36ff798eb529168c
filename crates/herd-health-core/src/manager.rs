//! The engine façade.
//!
//! [`HealthRecordManager`] is the only mutation path into the store. It runs
//! validation before anything is written, persists the primary record, and
//! then runs side effects (alerts, notifications, inventory, disease
//! workflows) that are isolated from each other and never undo the record.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::{add_days, Clock, SystemClock};
use crate::config::{EngineConfig, MAX_DAY_SPAN};
use crate::engine::{
    sort_schedule, AlertDraft, AlertEngine, DuplicateDetector, HealthMetricsCalculator,
    ScheduleCalculator, StatisticsCalculator, ValidationGate,
};
use crate::error::{HealthError, Result};
use crate::events::{EngineEvent, EventSink, LogEventSink};
use crate::ids::{EntityKind, IdGenerator, TimeOrderedIdGenerator};
use crate::models::{
    sort_alerts, ConsultationType, DiseaseRecord, DiseaseSeverity, GeoLocation, HealthAlert,
    HealthMetrics, HealthStatistics, HistoryFilters, MedicalHistory, MedicalRecord, Medication,
    MedicationLine, NewDiseaseRecord, NewMedicalRecord, NewTreatmentPlan, NewVaccination, Period,
    TreatmentPlan, TreatmentStatus, Vaccination, VaccinationScheduleItem, VaccinationStatus,
};
use crate::ports::{
    DiseaseResponse, GeoLocator, HerdDirectory, HerdMember, InventoryManager, Notifier,
    RecordConfirmation, RecordKind,
};
use crate::repository::{
    AlertQuery, DateRange, DiseaseQuery, HealthRepository, RecordQuery, TreatmentQuery,
    VaccinationInsert, VaccinationQuery,
};

/// Assembles a [`HealthRecordManager`].
///
/// Storage, notification, inventory and the herd directory are required.
/// Everything else has a default.
pub struct HealthRecordManagerBuilder {
    repository: Arc<dyn HealthRepository>,
    notifier: Arc<dyn Notifier>,
    inventory: Arc<dyn InventoryManager>,
    herd: Arc<dyn HerdDirectory>,
    geo: Option<Arc<dyn GeoLocator>>,
    disease_response: Option<Arc<dyn DiseaseResponse>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl HealthRecordManagerBuilder {
    pub fn with_geolocator(mut self, geo: Arc<dyn GeoLocator>) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn with_disease_response(mut self, response: Arc<dyn DiseaseResponse>) -> Self {
        self.disease_response = Some(response);
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> HealthRecordManager {
        let validation = ValidationGate::new(
            self.geo.clone(),
            Arc::clone(&self.inventory),
            Arc::clone(&self.events),
        );
        let duplicates = DuplicateDetector::new(
            Arc::clone(&self.repository),
            self.config.duplicate_window_days,
        );
        let schedule = ScheduleCalculator::new(&self.config);
        let metrics = HealthMetricsCalculator::new(Arc::clone(&self.repository));
        let statistics = StatisticsCalculator::new(Arc::clone(&self.repository));
        let alerts = AlertEngine::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.notifier),
            Arc::clone(&self.ids),
            Arc::clone(&self.events),
        );

        HealthRecordManager {
            repository: self.repository,
            notifier: self.notifier,
            inventory: self.inventory,
            herd: self.herd,
            geo: self.geo,
            disease_response: self.disease_response,
            ids: self.ids,
            clock: self.clock,
            events: self.events,
            config: self.config,
            validation,
            duplicates,
            schedule,
            metrics,
            statistics,
            alerts,
        }
    }
}

/// Entry point for every health record operation.
pub struct HealthRecordManager {
    repository: Arc<dyn HealthRepository>,
    notifier: Arc<dyn Notifier>,
    inventory: Arc<dyn InventoryManager>,
    herd: Arc<dyn HerdDirectory>,
    geo: Option<Arc<dyn GeoLocator>>,
    disease_response: Option<Arc<dyn DiseaseResponse>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    config: EngineConfig,
    validation: ValidationGate,
    duplicates: DuplicateDetector,
    schedule: ScheduleCalculator,
    metrics: HealthMetricsCalculator,
    statistics: StatisticsCalculator,
    alerts: AlertEngine,
}

impl HealthRecordManager {
    pub fn builder(
        repository: Arc<dyn HealthRepository>,
        notifier: Arc<dyn Notifier>,
        inventory: Arc<dyn InventoryManager>,
        herd: Arc<dyn HerdDirectory>,
    ) -> HealthRecordManagerBuilder {
        HealthRecordManagerBuilder {
            repository,
            notifier,
            inventory,
            herd,
            geo: None,
            disease_response: None,
            ids: Arc::new(TimeOrderedIdGenerator),
            clock: Arc::new(SystemClock),
            events: Arc::new(LogEventSink),
            config: EngineConfig::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Medical records
    // ------------------------------------------------------------------

    /// Store a consultation with its medication lines.
    ///
    /// Medication lines are stored one by one; a line that fails to store is
    /// reported and left out of the returned record.
    pub fn create_medical_record(
        &self,
        data: NewMedicalRecord,
        user_id: &str,
    ) -> Result<MedicalRecord> {
        const OP: &str = "create_medical_record";

        let surgery_check_due = self.guard(OP, &data.bovine_id, || {
            require_text(OP, "bovine_id", &data.bovine_id)?;
            require_text(OP, "user_id", user_id)?;
            if let Some(location) = &data.location {
                self.validation
                    .validate_location(OP, &data.bovine_id, location)?;
            }
            self.validation
                .validate_medications(OP, &data.bovine_id, &data.medications)?;
            match data.consultation_type {
                ConsultationType::Surgery => days_after(
                    OP,
                    "consultation_date",
                    data.consultation_date,
                    self.config.post_surgery_check_days,
                )
                .map(Some),
                _ => Ok(None),
            }
        })?;

        let now = self.clock.now();
        let mut record = MedicalRecord {
            id: self.ids.generate(EntityKind::MedicalRecord),
            bovine_id: data.bovine_id,
            consultation_type: data.consultation_type,
            consultation_date: data.consultation_date,
            location: data.location.map(|l| self.describe_location(l)),
            diagnosis: data.diagnosis,
            notes: data.notes,
            medications: Vec::new(),
            recorded_by: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.repository.insert_medical_record(&record)?;
        self.created("medical_record", &record.id, &record.bovine_id);

        for line in data.medications {
            let medication = Medication {
                medication_id: line.medication_id,
                dosage: line.dosage,
                cost: line.cost,
                health_record_id: record.id.clone(),
            };
            match self.repository.insert_record_medication(&medication) {
                Ok(()) => record.medications.push(medication),
                Err(e) => self.dependency_failed(
                    "repository",
                    "insert_record_medication",
                    &medication.medication_id,
                    e,
                ),
            }
        }

        let draft = match (record.consultation_type, surgery_check_due) {
            (ConsultationType::Emergency, _) => Some(AlertDraft::emergency_consultation(&record)),
            (ConsultationType::Surgery, Some(due)) => {
                Some(AlertDraft::post_surgery_check(&record, due))
            }
            _ => None,
        };
        if let Some(draft) = draft {
            self.raise_side_alert(draft, now);
        }

        self.confirm(
            RecordKind::MedicalRecord,
            &record.id,
            &record.bovine_id,
            user_id,
            now,
        );
        Ok(record)
    }

    pub fn get_medical_record(&self, id: &str) -> Result<MedicalRecord> {
        self.repository
            .get_medical_record(id)?
            .ok_or_else(|| not_found("medical_record", id))
    }

    // ------------------------------------------------------------------
    // Vaccinations
    // ------------------------------------------------------------------

    /// Record an administered vaccine and schedule its booster.
    ///
    /// Rejected with `DuplicateVaccination` when the same vaccine was given to
    /// the same animal inside the duplicate window. The check and the insert
    /// are one atomic step in the store.
    pub fn record_vaccination(&self, data: NewVaccination, user_id: &str) -> Result<Vaccination> {
        const OP: &str = "record_vaccination";

        let next_due = self.guard(OP, &data.bovine_id, || {
            require_text(OP, "bovine_id", &data.bovine_id)?;
            require_text(OP, "vaccine_id", &data.vaccine_id)?;
            require_text(OP, "user_id", user_id)?;
            self.validation
                .validate_location(OP, &data.bovine_id, &data.location)?;
            self.validation.validate_dose(
                OP,
                &data.bovine_id,
                &data.vaccine_id,
                data.dose_quantity,
            )?;

            let next_due = self
                .schedule
                .next_vaccination_due_date(&data.vaccine_id, data.administration_date)?;

            match self.duplicates.find_conflict(
                &data.bovine_id,
                &data.vaccine_id,
                data.administration_date,
            )? {
                Some(existing) => Err(duplicate(&data, existing.administration_date)),
                None => Ok(next_due),
            }
        })?;

        let now = self.clock.now();

        let vaccination = Vaccination {
            id: self.ids.generate(EntityKind::Vaccination),
            bovine_id: data.bovine_id.clone(),
            vaccine_id: data.vaccine_id.clone(),
            vaccine_name: data.vaccine_name.clone(),
            administration_date: data.administration_date,
            location: self.describe_location(data.location.clone()),
            dose_quantity: data.dose_quantity,
            batch_number: data.batch_number.clone(),
            next_due_date: Some(next_due),
            status: VaccinationStatus::Scheduled,
            recorded_by: user_id.to_string(),
            created_at: now,
        };

        let window = self.duplicates.window(data.administration_date)?;
        match self
            .repository
            .insert_vaccination_unique(&vaccination, &window)?
        {
            VaccinationInsert::Inserted => {}
            VaccinationInsert::Duplicate {
                administration_date,
                ..
            } => {
                return Err(self.rejected(OP, &data.bovine_id, duplicate(&data, administration_date)))
            }
        }
        self.created("vaccination", &vaccination.id, &vaccination.bovine_id);

        self.complete_earlier_follow_ups(&vaccination);

        if let Some(due) = vaccination.next_due_date {
            if let Err(e) = self.notifier.send_vaccination_reminder(&vaccination, due) {
                self.dependency_failed("notifier", "send_vaccination_reminder", &vaccination.id, e);
            }
        }

        if let Err(e) = self
            .inventory
            .consume(&vaccination.vaccine_id, vaccination.dose_quantity)
        {
            self.dependency_failed("inventory", "consume", &vaccination.vaccine_id, e);
        }

        self.confirm(
            RecordKind::Vaccination,
            &vaccination.id,
            &vaccination.bovine_id,
            user_id,
            now,
        );
        Ok(vaccination)
    }

    pub fn get_vaccination(&self, id: &str) -> Result<Vaccination> {
        self.repository
            .get_vaccination(id)?
            .ok_or_else(|| not_found("vaccination", id))
    }

    /// Update the booster interval used for vaccinations recorded from now on.
    pub fn set_vaccine_interval(&self, vaccine_id: &str, days: i64) -> Result<()> {
        self.schedule.set_interval(vaccine_id, days)
    }

    /// Upcoming boosters for a ranch, due within `days` from now.
    ///
    /// Sorted by priority, most urgent first, then by date.
    pub fn get_vaccination_schedule(
        &self,
        ranch_id: &str,
        days: i64,
    ) -> Result<Vec<VaccinationScheduleItem>> {
        const OP: &str = "get_vaccination_schedule";
        check_day_span(OP, "days", days)?;

        let now = self.clock.now();
        let horizon = days_after(OP, "days", now, days)?;
        let ids = living_ids(&self.herd_members(ranch_id, OP));
        let upcoming = self.repository.find_vaccinations(
            &VaccinationQuery::for_bovines(&ids)
                .with_statuses(&[VaccinationStatus::Scheduled])
                .due(DateRange::between(now, horizon)),
        )?;

        let mut items: Vec<VaccinationScheduleItem> = upcoming
            .iter()
            .filter_map(|v| self.schedule.schedule_item(v, now))
            .collect();
        sort_schedule(&mut items);
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Treatment plans
    // ------------------------------------------------------------------

    /// Create a treatment plan and reserve its medications.
    ///
    /// Either every line is reserved and the plan is stored, or nothing is:
    /// a failed reservation or a failed insert releases what was reserved.
    pub fn create_treatment_plan(
        &self,
        data: NewTreatmentPlan,
        user_id: &str,
    ) -> Result<TreatmentPlan> {
        const OP: &str = "create_treatment_plan";
        let now = self.clock.now();
        let start_date = data.start_date.unwrap_or(now);

        self.guard(OP, &data.bovine_id, || {
            require_text(OP, "bovine_id", &data.bovine_id)?;
            require_text(OP, "user_id", user_id)?;
            self.validation
                .validate_medications(OP, &data.bovine_id, &data.medications)?;
            if let Some(checkup) = data.next_checkup {
                if checkup < start_date {
                    return Err(HealthError::invalid_input(
                        OP,
                        "next_checkup",
                        "must not be before the start date",
                    ));
                }
            }
            self.validation
                .check_availability(&data.bovine_id, &data.medications)
        })?;

        self.reserve_all(OP, &data.bovine_id, &data.medications)?;

        let plan = TreatmentPlan {
            id: self.ids.generate(EntityKind::TreatmentPlan),
            total_cost: TreatmentPlan::sum_costs(&data.medications),
            bovine_id: data.bovine_id,
            diagnosis: data.diagnosis,
            medications: data.medications,
            status: if start_date > now {
                TreatmentStatus::Planned
            } else {
                TreatmentStatus::Active
            },
            start_date,
            next_checkup: data.next_checkup,
            recorded_by: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repository.insert_treatment_plan(&plan) {
            self.release_all(&plan.medications);
            return Err(e.into());
        }
        self.created("treatment_plan", &plan.id, &plan.bovine_id);

        if let Some(checkup) = plan.next_checkup {
            self.raise_side_alert(AlertDraft::treatment_follow_up(&plan, checkup), now);
        }

        Ok(plan)
    }

    pub fn get_treatment_plan(&self, id: &str) -> Result<TreatmentPlan> {
        self.repository
            .get_treatment_plan(id)?
            .ok_or_else(|| not_found("treatment_plan", id))
    }

    // ------------------------------------------------------------------
    // Disease records
    // ------------------------------------------------------------------

    /// Store a disease case and start the matching response workflows.
    ///
    /// Critical cases raise a `health_deterioration` alert before returning.
    pub fn record_disease(&self, data: NewDiseaseRecord, user_id: &str) -> Result<DiseaseRecord> {
        const OP: &str = "record_disease";

        let quarantine_end_date = self.guard(OP, &data.bovine_id, || {
            require_text(OP, "bovine_id", &data.bovine_id)?;
            require_text(OP, "disease_name", &data.disease_name)?;
            require_text(OP, "user_id", user_id)?;
            match (data.quarantine_required, data.quarantine_end_date) {
                (_, Some(end)) if end < data.detection_date => Err(HealthError::invalid_input(
                    OP,
                    "quarantine_end_date",
                    "must not be before the detection date",
                )),
                (true, None) => days_after(
                    OP,
                    "detection_date",
                    data.detection_date,
                    self.config.default_quarantine_days,
                )
                .map(Some),
                (_, end) => Ok(end),
            }
        })?;

        let now = self.clock.now();

        let record = DiseaseRecord {
            id: self.ids.generate(EntityKind::DiseaseRecord),
            bovine_id: data.bovine_id,
            disease_name: data.disease_name,
            severity: data.severity,
            status: data.status,
            detection_date: data.detection_date,
            is_contagious: data.is_contagious,
            is_reportable: data.is_reportable,
            quarantine_required: data.quarantine_required,
            quarantine_end_date,
            recorded_by: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.repository.insert_disease_record(&record)?;
        self.created("disease_record", &record.id, &record.bovine_id);

        if let Some(response) = &self.disease_response {
            if record.quarantine_required {
                if let Err(e) = response.initiate_quarantine(&record) {
                    self.dependency_failed("disease_response", "initiate_quarantine", &record.id, e);
                }
            }
            if record.is_contagious {
                if let Err(e) = response.handle_contagious(&record) {
                    self.dependency_failed("disease_response", "handle_contagious", &record.id, e);
                }
            }
            if record.is_reportable {
                if let Err(e) = response.file_report(&record) {
                    self.dependency_failed("disease_response", "file_report", &record.id, e);
                }
            }
        }

        if record.severity == DiseaseSeverity::Critical {
            self.raise_side_alert(AlertDraft::health_deterioration(&record), now);
        }

        Ok(record)
    }

    pub fn get_disease_record(&self, id: &str) -> Result<DiseaseRecord> {
        self.repository
            .get_disease_record(id)?
            .ok_or_else(|| not_found("disease_record", id))
    }

    // ------------------------------------------------------------------
    // Reads and rollups
    // ------------------------------------------------------------------

    /// Everything on file for one animal, newest first.
    ///
    /// Each collection is filtered on its own date field. Unknown animals
    /// yield an empty history.
    pub fn get_medical_history(
        &self,
        bovine_id: &str,
        filters: &HistoryFilters,
    ) -> Result<MedicalHistory> {
        if let (Some(start), Some(end)) = (filters.start_date, filters.end_date) {
            if start > end {
                return Err(HealthError::invalid_input(
                    "get_medical_history",
                    "start_date",
                    "must not be after end_date",
                ));
            }
        }
        let range = DateRange {
            start: filters.start_date,
            end: filters.end_date,
        };

        let records = self
            .repository
            .find_medical_records(&RecordQuery::for_bovine(bovine_id).within(range))?;

        let vaccinations = if filters.include_vaccinations {
            Some(
                self.repository.find_vaccinations(
                    &VaccinationQuery::for_bovine(bovine_id).administered(range),
                )?,
            )
        } else {
            None
        };

        let treatments = if filters.include_treatments {
            Some(
                self.repository
                    .find_treatment_plans(&TreatmentQuery::for_bovine(bovine_id).started(range))?,
            )
        } else {
            None
        };

        let diseases = if filters.include_diseases {
            Some(
                self.repository
                    .find_disease_records(&DiseaseQuery::for_bovine(bovine_id).detected(range))?,
            )
        } else {
            None
        };

        Ok(MedicalHistory {
            bovine_id: bovine_id.to_string(),
            records,
            vaccinations,
            treatments,
            diseases,
        })
    }

    pub fn calculate_health_metrics(&self, bovine_id: &str, period: Period) -> Result<HealthMetrics> {
        self.metrics.compute(bovine_id, period)
    }

    /// Ranch rollup over the last `period_days` days.
    pub fn get_health_statistics(
        &self,
        ranch_id: &str,
        period_days: i64,
    ) -> Result<HealthStatistics> {
        const OP: &str = "get_health_statistics";
        check_day_span(OP, "period_days", period_days)?;

        let period = Period::trailing_days(self.clock.now(), period_days).ok_or_else(|| {
            HealthError::invalid_input(OP, "period_days", "window start is out of range")
        })?;
        let herd = self.herd_members(ranch_id, OP);
        self.statistics.compute(ranch_id, &herd, period)
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    /// Scan a ranch's living animals for overdue follow-ups.
    ///
    /// Returns the alerts created by this run.
    pub fn process_health_alerts(&self, ranch_id: &str) -> Result<Vec<HealthAlert>> {
        let ids = living_ids(&self.herd_members(ranch_id, "process_health_alerts"));
        self.alerts.scan(&ids, self.clock.now())
    }

    /// Alerts of a ranch in listing order.
    pub fn list_alerts(&self, ranch_id: &str, include_resolved: bool) -> Result<Vec<HealthAlert>> {
        let herd = self.herd_members(ranch_id, "list_alerts");
        let ids: Vec<String> = herd.into_iter().map(|m| m.bovine_id).collect();

        let mut alerts = self
            .repository
            .find_alerts(&AlertQuery::for_bovines(&ids).include_resolved(include_resolved))?;
        sort_alerts(&mut alerts);
        Ok(alerts)
    }

    pub fn get_alert(&self, id: &str) -> Result<HealthAlert> {
        self.repository
            .get_alert(id)?
            .ok_or_else(|| not_found("alert", id))
    }

    /// Close an alert. Resolving twice is a no-op.
    pub fn resolve_alert(&self, id: &str) -> Result<HealthAlert> {
        let mut alert = self.get_alert(id)?;
        if !alert.is_resolved {
            self.repository.resolve_alert(id)?;
            alert.mark_resolved();
        }
        Ok(alert)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Run precondition checks, reporting any rejection as an event.
    fn guard<T, F>(&self, operation: &'static str, bovine_id: &str, checks: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        checks().map_err(|e| self.rejected(operation, bovine_id, e))
    }

    fn rejected(&self, operation: &'static str, bovine_id: &str, err: HealthError) -> HealthError {
        if !matches!(err, HealthError::Storage(_)) {
            self.events.emit(&EngineEvent::ValidationRejected {
                operation,
                bovine_id: bovine_id.to_string(),
                kind: err.kind(),
                reason: err.to_string(),
            });
        }
        err
    }

    fn created(&self, entity: &'static str, id: &str, bovine_id: &str) {
        self.events.emit(&EngineEvent::RecordCreated {
            entity,
            id: id.to_string(),
            bovine_id: bovine_id.to_string(),
        });
    }

    fn dependency_failed(
        &self,
        dependency: &'static str,
        operation: &'static str,
        subject: &str,
        error: impl std::fmt::Display,
    ) {
        self.events.emit(&EngineEvent::DependencyFailed {
            dependency,
            operation,
            subject: subject.to_string(),
            error: error.to_string(),
        });
    }

    /// Fill in a missing address from the geolocator.
    fn describe_location(&self, location: GeoLocation) -> GeoLocation {
        let Some(geo) = &self.geo else {
            return location;
        };
        if location.address.is_some() {
            return location;
        }
        match geo.describe(location.latitude, location.longitude) {
            Ok(Some(address)) => location.with_address(address),
            Ok(None) => location,
            Err(e) => {
                self.dependency_failed(
                    "geolocator",
                    "describe",
                    &format!("{},{}", location.latitude, location.longitude),
                    e,
                );
                location
            }
        }
    }

    /// Alerts raised as a side effect: stored and dispatched, failures
    /// reported only.
    fn raise_side_alert(&self, draft: AlertDraft, now: DateTime<Utc>) {
        let subject = draft.related_record_id.clone();
        if let Err(e) = self.alerts.raise_and_dispatch(draft, now) {
            self.dependency_failed("repository", "insert_alert", &subject, e);
        }
    }

    fn confirm(
        &self,
        kind: RecordKind,
        record_id: &str,
        bovine_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) {
        let confirmation = RecordConfirmation {
            kind,
            record_id: record_id.to_string(),
            bovine_id: bovine_id.to_string(),
            recorded_by: user_id.to_string(),
            recorded_at: at,
        };
        if let Err(e) = self.notifier.send_record_confirmation(&confirmation) {
            self.dependency_failed("notifier", "send_record_confirmation", record_id, e);
        }
    }

    /// Earlier open boosters of the same vaccine are satisfied by this dose.
    fn complete_earlier_follow_ups(&self, latest: &Vaccination) {
        let query = VaccinationQuery::for_bovine(&latest.bovine_id)
            .vaccine(&latest.vaccine_id)
            .with_statuses(&[VaccinationStatus::Scheduled, VaccinationStatus::Overdue])
            .administered(DateRange::up_to(latest.administration_date));

        let earlier = match self.repository.find_vaccinations(&query) {
            Ok(found) => found,
            Err(e) => {
                self.dependency_failed("repository", "find_vaccinations", &latest.id, e);
                return;
            }
        };

        for vaccination in earlier.iter().filter(|v| v.id != latest.id) {
            match self
                .repository
                .update_vaccination_status(&vaccination.id, VaccinationStatus::Completed)
            {
                Ok(_) => self.events.emit(&EngineEvent::VaccinationStatusChanged {
                    id: vaccination.id.clone(),
                    status: VaccinationStatus::Completed.as_str(),
                }),
                Err(e) => self.dependency_failed(
                    "repository",
                    "update_vaccination_status",
                    &vaccination.id,
                    e,
                ),
            }
        }
    }

    fn reserve_all(
        &self,
        operation: &'static str,
        bovine_id: &str,
        lines: &[MedicationLine],
    ) -> Result<()> {
        for (reserved, line) in lines.iter().enumerate() {
            if let Err(e) = self.inventory.reserve(&line.medication_id, line.dosage) {
                self.dependency_failed("inventory", "reserve", &line.medication_id, e);
                self.release_all(&lines[..reserved]);
                return Err(self.rejected(
                    operation,
                    bovine_id,
                    HealthError::MedicationUnavailable {
                        bovine_id: bovine_id.to_string(),
                        medication_id: line.medication_id.clone(),
                        quantity: line.dosage,
                    },
                ));
            }
        }
        Ok(())
    }

    fn release_all(&self, lines: &[MedicationLine]) {
        for line in lines {
            if let Err(e) = self.inventory.release(&line.medication_id, line.dosage) {
                self.dependency_failed("inventory", "release", &line.medication_id, e);
            }
        }
    }

    /// Ranch members, or none when the directory cannot answer.
    fn herd_members(&self, ranch_id: &str, operation: &'static str) -> Vec<HerdMember> {
        match self.herd.animals_in_ranch(ranch_id) {
            Ok(members) => members,
            Err(e) => {
                self.dependency_failed("herd_directory", operation, ranch_id, e);
                Vec::new()
            }
        }
    }
}

fn living_ids(herd: &[HerdMember]) -> Vec<String> {
    herd.iter()
        .filter(|m| !m.deceased)
        .map(|m| m.bovine_id.clone())
        .collect()
}

fn require_text(operation: &'static str, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(HealthError::invalid_input(operation, field, "must not be empty"))
    } else {
        Ok(())
    }
}

fn check_day_span(operation: &'static str, field: &'static str, days: i64) -> Result<()> {
    if (0..=MAX_DAY_SPAN).contains(&days) {
        Ok(())
    } else {
        Err(HealthError::invalid_input(
            operation,
            field,
            format!("must be within 0..={}, got {}", MAX_DAY_SPAN, days),
        ))
    }
}

fn days_after(
    operation: &'static str,
    field: &'static str,
    at: DateTime<Utc>,
    days: i64,
) -> Result<DateTime<Utc>> {
    add_days(at, days).ok_or_else(|| {
        HealthError::invalid_input(operation, field, format!("{} days later is out of range", days))
    })
}

fn not_found(entity: &'static str, id: &str) -> HealthError {
    HealthError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn duplicate(data: &NewVaccination, administration_date: DateTime<Utc>) -> HealthError {
    HealthError::DuplicateVaccination {
        bovine_id: data.bovine_id.clone(),
        vaccine_id: data.vaccine_id.clone(),
        administration_date,
    }
}
