//! [`HealthRepository`] backed by SQLite.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{Database, DbError, DbResult};
use crate::models::{
    DiseaseRecord, HealthAlert, MedicalRecord, Medication, TreatmentPlan, Vaccination,
    VaccinationStatus,
};
use crate::repository::{
    AlertQuery, DateRange, DiseaseQuery, HealthRepository, RecordQuery, StorageResult,
    TreatmentQuery, VaccinationInsert, VaccinationQuery,
};

/// Thread-safe SQLite store.
///
/// Every call holds the connection lock for exactly one statement or one
/// transaction, so check-then-insert sequences are serialized.
pub struct SqliteHealthStore {
    db: Mutex<Database>,
}

impl SqliteHealthStore {
    /// Open or create a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Create an in-memory store (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Database>> {
        self.db.lock().map_err(DbError::from)
    }
}

impl HealthRepository for SqliteHealthStore {
    fn insert_medical_record(&self, record: &MedicalRecord) -> StorageResult<()> {
        Ok(self.lock()?.insert_medical_record(record)?)
    }

    fn insert_record_medication(&self, medication: &Medication) -> StorageResult<()> {
        Ok(self.lock()?.insert_record_medication(medication)?)
    }

    fn get_medical_record(&self, id: &str) -> StorageResult<Option<MedicalRecord>> {
        Ok(self.lock()?.get_medical_record(id)?)
    }

    fn find_medical_records(&self, query: &RecordQuery) -> StorageResult<Vec<MedicalRecord>> {
        Ok(self.lock()?.find_medical_records(query)?)
    }

    fn insert_vaccination_unique(
        &self,
        vaccination: &Vaccination,
        lookback: &DateRange,
    ) -> StorageResult<VaccinationInsert> {
        Ok(self.lock()?.insert_vaccination_unique(vaccination, lookback)?)
    }

    fn get_vaccination(&self, id: &str) -> StorageResult<Option<Vaccination>> {
        Ok(self.lock()?.get_vaccination(id)?)
    }

    fn find_vaccinations(&self, query: &VaccinationQuery) -> StorageResult<Vec<Vaccination>> {
        Ok(self.lock()?.find_vaccinations(query)?)
    }

    fn count_vaccinations(&self, query: &VaccinationQuery) -> StorageResult<usize> {
        Ok(self.lock()?.count_vaccinations(query)?)
    }

    fn update_vaccination_status(
        &self,
        id: &str,
        status: VaccinationStatus,
    ) -> StorageResult<bool> {
        Ok(self.lock()?.update_vaccination_status(id, status)?)
    }

    fn insert_treatment_plan(&self, plan: &TreatmentPlan) -> StorageResult<()> {
        Ok(self.lock()?.insert_treatment_plan(plan)?)
    }

    fn get_treatment_plan(&self, id: &str) -> StorageResult<Option<TreatmentPlan>> {
        Ok(self.lock()?.get_treatment_plan(id)?)
    }

    fn find_treatment_plans(&self, query: &TreatmentQuery) -> StorageResult<Vec<TreatmentPlan>> {
        Ok(self.lock()?.find_treatment_plans(query)?)
    }

    fn count_treatment_plans(&self, query: &TreatmentQuery) -> StorageResult<usize> {
        Ok(self.lock()?.count_treatment_plans(query)?)
    }

    fn insert_disease_record(&self, record: &DiseaseRecord) -> StorageResult<()> {
        Ok(self.lock()?.insert_disease_record(record)?)
    }

    fn get_disease_record(&self, id: &str) -> StorageResult<Option<DiseaseRecord>> {
        Ok(self.lock()?.get_disease_record(id)?)
    }

    fn find_disease_records(&self, query: &DiseaseQuery) -> StorageResult<Vec<DiseaseRecord>> {
        Ok(self.lock()?.find_disease_records(query)?)
    }

    fn count_disease_records(&self, query: &DiseaseQuery) -> StorageResult<usize> {
        Ok(self.lock()?.count_disease_records(query)?)
    }

    fn insert_alert(&self, alert: &HealthAlert) -> StorageResult<bool> {
        Ok(self.lock()?.insert_alert(alert)?)
    }

    fn get_alert(&self, id: &str) -> StorageResult<Option<HealthAlert>> {
        Ok(self.lock()?.get_alert(id)?)
    }

    fn find_alerts(&self, query: &AlertQuery) -> StorageResult<Vec<HealthAlert>> {
        Ok(self.lock()?.find_alerts(query)?)
    }

    fn mark_alert_notified(&self, id: &str) -> StorageResult<bool> {
        Ok(self.lock()?.mark_alert_notified(id)?)
    }

    fn resolve_alert(&self, id: &str) -> StorageResult<bool> {
        Ok(self.lock()?.resolve_alert(id)?)
    }
}
