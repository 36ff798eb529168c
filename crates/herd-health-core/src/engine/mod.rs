//! Decision logic of the health record engine.
//!
//! Each component owns one rule set and talks to storage and collaborators
//! only through the traits in [`crate::repository`] and [`crate::ports`].

mod alerts;
mod duplicate;
mod metrics;
mod schedule;
mod statistics;
mod validation;

pub use alerts::{AlertDraft, AlertEngine};
pub use duplicate::DuplicateDetector;
pub use metrics::{health_score, recommendations, risk_factors, HealthMetricsCalculator};
pub use schedule::{sort_schedule, ScheduleCalculator};
pub use statistics::{percentage, StatisticsCalculator};
pub use validation::ValidationGate;
