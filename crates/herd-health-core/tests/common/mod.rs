//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use herd_health_core::{
    DiseaseRecord, DiseaseResponse, EngineEvent, EventSink, FixedClock, GeoLocation, GeoLocator,
    HealthAlert, HealthRecordManager, HerdDirectory, HerdMember, InventoryManager, Notifier,
    RecordConfirmation, SequentialIdGenerator, SqliteHealthStore, Vaccination,
};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()
}

pub fn farm() -> GeoLocation {
    GeoLocation::new(-31.4, -64.2)
}

#[derive(Default)]
pub struct FakeNotifier {
    pub alerts: Mutex<Vec<String>>,
    pub reminders: Mutex<Vec<(String, DateTime<Utc>)>>,
    pub confirmations: Mutex<Vec<RecordConfirmation>>,
    pub fail: Mutex<bool>,
}

impl FakeNotifier {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn sent_alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    fn check(&self) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("messaging gateway unavailable");
        }
        Ok(())
    }
}

impl Notifier for FakeNotifier {
    fn send_health_alert(&self, alert: &HealthAlert) -> anyhow::Result<()> {
        self.check()?;
        self.alerts.lock().unwrap().push(alert.id.clone());
        Ok(())
    }

    fn send_vaccination_reminder(
        &self,
        vaccination: &Vaccination,
        due_date: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.check()?;
        self.reminders
            .lock()
            .unwrap()
            .push((vaccination.id.clone(), due_date));
        Ok(())
    }

    fn send_record_confirmation(&self, confirmation: &RecordConfirmation) -> anyhow::Result<()> {
        self.check()?;
        self.confirmations.lock().unwrap().push(confirmation.clone());
        Ok(())
    }
}

/// Stock levels with a reservation ledger.
#[derive(Default)]
pub struct FakeInventory {
    pub stock: Mutex<HashMap<String, f64>>,
    pub reserved: Mutex<HashMap<String, f64>>,
    pub consumed: Mutex<Vec<(String, f64)>>,
    /// Items whose `reserve` call fails even though stock is available
    pub reserve_fails: Mutex<Vec<String>>,
}

impl FakeInventory {
    pub fn with_stock(items: &[(&str, f64)]) -> Self {
        let inventory = Self::default();
        {
            let mut stock = inventory.stock.lock().unwrap();
            for (id, qty) in items {
                stock.insert(id.to_string(), *qty);
            }
        }
        inventory
    }

    pub fn reserved(&self, item_id: &str) -> f64 {
        self.reserved
            .lock()
            .unwrap()
            .get(item_id)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn total_reserved(&self) -> f64 {
        self.reserved.lock().unwrap().values().sum()
    }
}

impl InventoryManager for FakeInventory {
    fn check_availability(&self, item_id: &str, quantity: f64) -> anyhow::Result<bool> {
        let stock = self.stock.lock().unwrap().get(item_id).copied().unwrap_or(0.0);
        Ok(stock - self.reserved(item_id) >= quantity)
    }

    fn reserve(&self, item_id: &str, quantity: f64) -> anyhow::Result<()> {
        if self.reserve_fails.lock().unwrap().iter().any(|i| i == item_id) {
            anyhow::bail!("reservation rejected for {}", item_id);
        }
        *self
            .reserved
            .lock()
            .unwrap()
            .entry(item_id.to_string())
            .or_insert(0.0) += quantity;
        Ok(())
    }

    fn release(&self, item_id: &str, quantity: f64) -> anyhow::Result<()> {
        *self
            .reserved
            .lock()
            .unwrap()
            .entry(item_id.to_string())
            .or_insert(0.0) -= quantity;
        Ok(())
    }

    fn consume(&self, item_id: &str, quantity: f64) -> anyhow::Result<()> {
        self.consumed
            .lock()
            .unwrap()
            .push((item_id.to_string(), quantity));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeHerd {
    pub ranches: Mutex<HashMap<String, Vec<HerdMember>>>,
}

impl FakeHerd {
    pub fn with_ranch(ranch_id: &str, members: Vec<HerdMember>) -> Self {
        let herd = Self::default();
        herd.ranches
            .lock()
            .unwrap()
            .insert(ranch_id.to_string(), members);
        herd
    }
}

impl HerdDirectory for FakeHerd {
    fn animals_in_ranch(&self, ranch_id: &str) -> anyhow::Result<Vec<HerdMember>> {
        Ok(self
            .ranches
            .lock()
            .unwrap()
            .get(ranch_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeDiseaseResponse {
    pub calls: Mutex<Vec<(&'static str, String)>>,
    pub fail_quarantine: bool,
}

impl DiseaseResponse for FakeDiseaseResponse {
    fn initiate_quarantine(&self, record: &DiseaseRecord) -> anyhow::Result<()> {
        if self.fail_quarantine {
            anyhow::bail!("quarantine service offline");
        }
        self.calls
            .lock()
            .unwrap()
            .push(("quarantine", record.id.clone()));
        Ok(())
    }

    fn handle_contagious(&self, record: &DiseaseRecord) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(("contagious", record.id.clone()));
        Ok(())
    }

    fn file_report(&self, record: &DiseaseRecord) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(("report", record.id.clone()));
        Ok(())
    }
}

/// Resolves every coordinate to the same address.
pub struct FakeGeo;

impl GeoLocator for FakeGeo {
    fn is_valid_coordinate(&self, _latitude: f64, _longitude: f64) -> anyhow::Result<bool> {
        Ok(true)
    }

    fn describe(&self, _latitude: f64, _longitude: f64) -> anyhow::Result<Option<String>> {
        Ok(Some("Paddock 4, Estancia La Paz".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn dependency_failures(&self) -> Vec<EngineEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, EngineEvent::DependencyFailed { .. }))
            .cloned()
            .collect()
    }

    pub fn rejections(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, EngineEvent::ValidationRejected { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &EngineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A manager over an in-memory store with handles on every fake.
pub struct Harness {
    pub manager: HealthRecordManager,
    pub store: Arc<SqliteHealthStore>,
    pub notifier: Arc<FakeNotifier>,
    pub inventory: Arc<FakeInventory>,
    pub herd: Arc<FakeHerd>,
    pub disease_response: Arc<FakeDiseaseResponse>,
    pub clock: Arc<FixedClock>,
    pub events: Arc<RecordingSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_parts(
            FakeInventory::with_stock(&[
                ("oxytetracycline", 500.0),
                ("meloxicam", 100.0),
                ("penicillin", 5.0),
                ("fmd", 100.0),
            ]),
            FakeHerd::with_ranch(
                "ranch-1",
                vec![
                    HerdMember::alive("cow-1"),
                    HerdMember::alive("cow-2"),
                    HerdMember::alive("cow-3"),
                    HerdMember {
                        bovine_id: "cow-4".into(),
                        deceased: true,
                    },
                ],
            ),
            FakeDiseaseResponse::default(),
        )
    }

    pub fn with_parts(
        inventory: FakeInventory,
        herd: FakeHerd,
        disease_response: FakeDiseaseResponse,
    ) -> Self {
        let store = Arc::new(SqliteHealthStore::open_in_memory().unwrap());
        let notifier = Arc::new(FakeNotifier::default());
        let inventory = Arc::new(inventory);
        let herd = Arc::new(herd);
        let disease_response = Arc::new(disease_response);
        let clock = Arc::new(FixedClock::new(now()));
        let events = Arc::new(RecordingSink::default());

        let manager = HealthRecordManager::builder(
            store.clone(),
            notifier.clone(),
            inventory.clone(),
            herd.clone(),
        )
        .with_disease_response(disease_response.clone())
        .with_id_generator(Arc::new(SequentialIdGenerator::new()))
        .with_clock(clock.clone())
        .with_event_sink(events.clone())
        .build();

        Self {
            manager,
            store,
            notifier,
            inventory,
            herd,
            disease_response,
            clock,
            events,
        }
    }
}
