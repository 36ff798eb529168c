//! Engine configuration.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Upper bound for every day count the engine accepts, about a century.
pub const MAX_DAY_SPAN: i64 = 36_500;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Days-until-due cut-offs for schedule priority. Each bound is inclusive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PriorityThresholds {
    pub urgent_days: i64,
    pub high_days: i64,
    pub medium_days: i64,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        Self {
            urgent_days: 3,
            high_days: 7,
            medium_days: 14,
        }
    }
}

/// Tunables for the health record engine.
///
/// Every field is optional in JSON; missing ones take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lookback for duplicate vaccinations
    pub duplicate_window_days: i64,
    /// Interval for vaccines missing from `vaccine_intervals`
    pub default_vaccine_interval_days: i64,
    /// Booster interval per vaccine id
    pub vaccine_intervals: HashMap<String, i64>,
    pub priority_thresholds: PriorityThresholds,
    pub default_quarantine_days: i64,
    pub post_surgery_check_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let vaccine_intervals = [
            ("fmd", 180),
            ("clostridial", 180),
            ("lepto", 180),
            ("blackleg", 180),
            ("ibr", 365),
            ("bvd", 365),
            ("rabies", 365),
            ("anthrax", 365),
        ]
        .into_iter()
        .map(|(id, days)| (id.to_string(), days))
        .collect();

        Self {
            duplicate_window_days: 30,
            default_vaccine_interval_days: 365,
            vaccine_intervals,
            priority_thresholds: PriorityThresholds::default(),
            default_quarantine_days: 21,
            post_surgery_check_days: 7,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_days("duplicate_window_days", self.duplicate_window_days, 0)?;
        check_days(
            "default_vaccine_interval_days",
            self.default_vaccine_interval_days,
            1,
        )?;
        for (id, days) in &self.vaccine_intervals {
            check_days(&format!("interval for vaccine {}", id), *days, 1)?;
        }
        let t = &self.priority_thresholds;
        if !(t.urgent_days <= t.high_days && t.high_days <= t.medium_days) {
            return Err(ConfigError::Invalid(
                "priority thresholds must be ordered urgent <= high <= medium".into(),
            ));
        }
        check_days("default_quarantine_days", self.default_quarantine_days, 0)?;
        check_days("post_surgery_check_days", self.post_surgery_check_days, 0)?;
        Ok(())
    }
}

fn check_days(name: &str, days: i64, min: i64) -> Result<(), ConfigError> {
    if (min..=MAX_DAY_SPAN).contains(&days) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be within {}..={}, got {}",
            name, min, MAX_DAY_SPAN, days
        )))
    }
}
