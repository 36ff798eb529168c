//! Herd Health Core Library
//!
//! Livestock health record engine: consultations, vaccinations, treatment
//! plans, disease cases, and the schedules and alerts derived from them.
//!
//! # Architecture
//!
//! ```text
//!            caller (HTTP layer, CLI, jobs)
//!                         │
//!                         ▼
//!               ┌───────────────────┐
//!               │HealthRecordManager│
//!               └─────────┬─────────┘
//!                         │
//!     ┌───────────────────┼────────────────────┬──────────────────┐
//!     ▼                   ▼                    ▼                  ▼
//! ValidationGate   DuplicateDetector   ScheduleCalculator   HealthMetrics /
//!     │             (atomic insert)     (interval table)     Statistics
//!     │                   │                    │                  │
//!     └───────────────────┴─────────┬──────────┴──────────────────┘
//!                                   ▼
//!                         HealthRepository (SQLite)
//!                                   │
//!                                   ▼
//!                              AlertEngine
//!                     (dedupe key, at-least-once dispatch)
//!                                   │
//!           ┌──────────────┬────────┴───────┬────────────────┐
//!           ▼              ▼                ▼                ▼
//!       Notifier      Inventory       DiseaseResponse    EventSink
//! ```
//!
//! # Core Principle
//!
//! **A stored record is never undone by a side effect.** Validation runs
//! before anything is written; notification, inventory and workflow failures
//! afterwards are reported as events and the record stands.
//!
//! # Modules
//!
//! - [`manager`]: The façade exposing every operation
//! - [`engine`]: Validation, duplicates, schedules, metrics, alerts
//! - [`repository`]: Storage trait and query types
//! - [`db`]: SQLite implementation of the repository
//! - [`models`]: Domain types (MedicalRecord, Vaccination, HealthAlert, etc.)
//! - [`ports`]: Notification, inventory, geolocation, herd and disease collaborators

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod events;
pub mod ids;
pub mod manager;
pub mod models;
pub mod ports;
pub mod repository;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig, MAX_DAY_SPAN};
pub use db::{Database, SqliteHealthStore};
pub use error::{ErrorKind, HealthError, Result};
pub use events::{EngineEvent, EventSink, LogEventSink};
pub use ids::{EntityKind, IdGenerator, SequentialIdGenerator, TimeOrderedIdGenerator};
pub use manager::{HealthRecordManager, HealthRecordManagerBuilder};
pub use models::{
    AlertSeverity, AlertType, ConsultationType, DiseaseRecord, DiseaseSeverity, DiseaseStatus,
    GeoLocation, HealthAlert, HealthMetrics, HealthStatistics, HistoryFilters, MedicalHistory,
    MedicalRecord, MedicationLine, NewDiseaseRecord, NewMedicalRecord, NewTreatmentPlan,
    NewVaccination, Period, SchedulePriority, TreatmentPlan, TreatmentStatus, Vaccination,
    VaccinationScheduleItem, VaccinationStatus,
};
pub use ports::{
    DiseaseResponse, GeoLocator, HerdDirectory, HerdMember, InventoryManager, Notifier,
    RecordConfirmation, RecordKind,
};
pub use repository::{HealthRepository, StorageError};

/// Open a SQLite-backed store at `path` and wrap it for sharing.
pub fn open_store(path: &str) -> std::result::Result<std::sync::Arc<SqliteHealthStore>, db::DbError> {
    Ok(std::sync::Arc::new(SqliteHealthStore::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HealthRecordManager>();
        assert_send_sync::<SqliteHealthStore>();
    }

    #[test]
    fn test_open_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herd.db");
        let store = open_store(path.to_str().unwrap()).unwrap();
        assert!(store.get_alert("alt_missing").unwrap().is_none());
    }
}
