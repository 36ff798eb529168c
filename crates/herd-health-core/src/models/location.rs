//! Geographic location attached to records and vaccinations.

use serde::{Deserialize, Serialize};

/// A point on the map where a consultation or vaccination took place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    /// Latitude in decimal degrees (-90..=90)
    pub latitude: f64,
    /// Longitude in decimal degrees (-180..=180)
    pub longitude: f64,
    /// Human-readable label, filled by reverse lookup when absent
    pub address: Option<String>,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    /// Builder-style address setter.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Whether both coordinates are finite and inside their ranges.
    pub fn is_in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}
