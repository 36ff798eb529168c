//! Preconditions checked before any mutation.

use std::sync::Arc;

use crate::error::{HealthError, Result};
use crate::events::{EngineEvent, EventSink};
use crate::models::{GeoLocation, MedicationLine};
use crate::ports::{GeoLocator, InventoryManager};

/// Structural and semantic checks. Never writes anything.
pub struct ValidationGate {
    geo: Option<Arc<dyn GeoLocator>>,
    inventory: Arc<dyn InventoryManager>,
    events: Arc<dyn EventSink>,
}

impl ValidationGate {
    pub fn new(
        geo: Option<Arc<dyn GeoLocator>>,
        inventory: Arc<dyn InventoryManager>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            geo,
            inventory,
            events,
        }
    }

    /// Coordinates must be finite and inside the WGS84 ranges.
    ///
    /// An injected geolocator gets the final say on in-range coordinates; if
    /// it fails, the range check stands.
    pub fn validate_location(
        &self,
        operation: &'static str,
        bovine_id: &str,
        location: &GeoLocation,
    ) -> Result<()> {
        let invalid = || HealthError::InvalidLocation {
            operation,
            bovine_id: bovine_id.to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
        };

        if !location.is_in_range() {
            return Err(invalid());
        }

        if let Some(geo) = &self.geo {
            match geo.is_valid_coordinate(location.latitude, location.longitude) {
                Ok(true) => {}
                Ok(false) => return Err(invalid()),
                Err(e) => self.events.emit(&EngineEvent::DependencyFailed {
                    dependency: "geolocator",
                    operation: "is_valid_coordinate",
                    subject: bovine_id.to_string(),
                    error: e.to_string(),
                }),
            }
        }

        Ok(())
    }

    /// Every line needs a positive dosage and a non-negative cost.
    pub fn validate_medications(
        &self,
        operation: &'static str,
        bovine_id: &str,
        lines: &[MedicationLine],
    ) -> Result<()> {
        for line in lines {
            if line.medication_id.trim().is_empty() {
                return Err(HealthError::invalid_input(
                    operation,
                    "medication_id",
                    "must not be empty",
                ));
            }
            if !valid_quantity(line.dosage) || !(line.cost.is_finite() && line.cost >= 0.0) {
                return Err(HealthError::InvalidMedicationDosage {
                    operation,
                    bovine_id: bovine_id.to_string(),
                    medication_id: line.medication_id.clone(),
                    dosage: line.dosage,
                    cost: line.cost,
                });
            }
        }
        Ok(())
    }

    /// Vaccine doses follow the medication dosage rule; vaccines carry no cost
    /// on the record.
    pub fn validate_dose(
        &self,
        operation: &'static str,
        bovine_id: &str,
        vaccine_id: &str,
        dose_quantity: f64,
    ) -> Result<()> {
        if valid_quantity(dose_quantity) {
            Ok(())
        } else {
            Err(HealthError::InvalidMedicationDosage {
                operation,
                bovine_id: bovine_id.to_string(),
                medication_id: vaccine_id.to_string(),
                dosage: dose_quantity,
                cost: 0.0,
            })
        }
    }

    /// Ask inventory about every line; the first unavailable one aborts.
    ///
    /// An inventory error counts as unavailable.
    pub fn check_availability(&self, bovine_id: &str, lines: &[MedicationLine]) -> Result<()> {
        for line in lines {
            let available = match self
                .inventory
                .check_availability(&line.medication_id, line.dosage)
            {
                Ok(available) => available,
                Err(e) => {
                    self.events.emit(&EngineEvent::DependencyFailed {
                        dependency: "inventory",
                        operation: "check_availability",
                        subject: line.medication_id.clone(),
                        error: e.to_string(),
                    });
                    false
                }
            };

            if !available {
                return Err(HealthError::MedicationUnavailable {
                    bovine_id: bovine_id.to_string(),
                    medication_id: line.medication_id.clone(),
                    quantity: line.dosage,
                });
            }
        }
        Ok(())
    }
}

fn valid_quantity(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
