//! Domain models for the herd health system.

mod alert;
mod disease;
mod history;
mod location;
mod metrics;
mod record;
mod treatment;
mod vaccination;

pub use alert::*;
pub use disease::*;
pub use history::*;
pub use location::*;
pub use metrics::*;
pub use record::*;
pub use treatment::*;
pub use vaccination::*;
