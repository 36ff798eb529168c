//! Identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Entity kinds that receive generated ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    MedicalRecord,
    Vaccination,
    TreatmentPlan,
    DiseaseRecord,
    Alert,
}

impl EntityKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::MedicalRecord => "rec",
            EntityKind::Vaccination => "vac",
            EntityKind::TreatmentPlan => "trt",
            EntityKind::DiseaseRecord => "dis",
            EntityKind::Alert => "alt",
        }
    }
}

/// Produces ids unique within an entity kind.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, kind: EntityKind) -> String;
}

/// `<prefix>_<uuid v7>`: millisecond timestamp followed by random bits, so
/// ids created later sort later.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeOrderedIdGenerator;

impl IdGenerator for TimeOrderedIdGenerator {
    fn generate(&self, kind: EntityKind) -> String {
        format!("{}_{}", kind.prefix(), Uuid::now_v7().simple())
    }
}

/// `<prefix>_<n>` with a shared counter. Deterministic, for tests.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, kind: EntityKind) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}_{:06}", kind.prefix(), n)
    }
}
