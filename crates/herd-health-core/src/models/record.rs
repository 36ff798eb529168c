//! Consultation records and their applied medications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::location::GeoLocation;

/// Kind of veterinary consultation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    Routine,
    Emergency,
    FollowUp,
    Surgery,
    Diagnostic,
    Vaccination,
}

impl ConsultationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationType::Routine => "routine",
            ConsultationType::Emergency => "emergency",
            ConsultationType::FollowUp => "follow_up",
            ConsultationType::Surgery => "surgery",
            ConsultationType::Diagnostic => "diagnostic",
            ConsultationType::Vaccination => "vaccination",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "routine" => Some(ConsultationType::Routine),
            "emergency" => Some(ConsultationType::Emergency),
            "follow_up" => Some(ConsultationType::FollowUp),
            "surgery" => Some(ConsultationType::Surgery),
            "diagnostic" => Some(ConsultationType::Diagnostic),
            "vaccination" => Some(ConsultationType::Vaccination),
            _ => None,
        }
    }
}

/// A medication line as supplied by the caller (no back-reference yet).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationLine {
    /// Inventory identifier of the product
    pub medication_id: String,
    /// Dose administered or planned
    pub dosage: f64,
    /// Cost charged for this line
    pub cost: f64,
}

impl MedicationLine {
    pub fn new(medication_id: impl Into<String>, dosage: f64, cost: f64) -> Self {
        Self {
            medication_id: medication_id.into(),
            dosage,
            cost,
        }
    }
}

/// A medication applied during a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub medication_id: String,
    pub dosage: f64,
    pub cost: f64,
    /// Owning medical record (non-owning reference)
    pub health_record_id: String,
}

/// A persisted consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub id: String,
    pub bovine_id: String,
    pub consultation_type: ConsultationType,
    pub consultation_date: DateTime<Utc>,
    pub location: Option<GeoLocation>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    /// Medication lines that were stored with this record
    pub medications: Vec<Medication>,
    /// User who recorded the consultation
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicalRecord {
    /// Sum of the stored medication line costs.
    pub fn medication_cost(&self) -> f64 {
        self.medications.iter().map(|m| m.cost).sum()
    }
}

/// Input for `create_medical_record`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMedicalRecord {
    pub bovine_id: String,
    pub consultation_type: ConsultationType,
    pub consultation_date: DateTime<Utc>,
    pub location: Option<GeoLocation>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub medications: Vec<MedicationLine>,
}

impl NewMedicalRecord {
    pub fn new(
        bovine_id: impl Into<String>,
        consultation_type: ConsultationType,
        consultation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            bovine_id: bovine_id.into(),
            consultation_type,
            consultation_date,
            location: None,
            diagnosis: None,
            notes: None,
            medications: Vec::new(),
        }
    }
}
