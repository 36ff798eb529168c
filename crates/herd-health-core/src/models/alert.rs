//! Health alerts raised by the engine.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What condition an alert reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    VaccinationDue,
    TreatmentOverdue,
    HealthDeterioration,
    TreatmentFollowUp,
    EmergencyConsultation,
    PostSurgeryCheck,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::VaccinationDue => "vaccination_due",
            AlertType::TreatmentOverdue => "treatment_overdue",
            AlertType::HealthDeterioration => "health_deterioration",
            AlertType::TreatmentFollowUp => "treatment_follow_up",
            AlertType::EmergencyConsultation => "emergency_consultation",
            AlertType::PostSurgeryCheck => "post_surgery_check",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vaccination_due" => Some(AlertType::VaccinationDue),
            "treatment_overdue" => Some(AlertType::TreatmentOverdue),
            "health_deterioration" => Some(AlertType::HealthDeterioration),
            "treatment_follow_up" => Some(AlertType::TreatmentFollowUp),
            "emergency_consultation" => Some(AlertType::EmergencyConsultation),
            "post_surgery_check" => Some(AlertType::PostSurgeryCheck),
            _ => None,
        }
    }
}

/// Alert severity. Ordered low to critical.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Urgent,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Urgent => "urgent",
            AlertSeverity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(AlertSeverity::Low),
            "medium" => Some(AlertSeverity::Medium),
            "high" => Some(AlertSeverity::High),
            "urgent" => Some(AlertSeverity::Urgent),
            "critical" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }
}

/// An actionable alert about one animal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthAlert {
    pub id: String,
    pub bovine_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    /// Free-form context (JSON object)
    pub details: serde_json::Value,
    pub trigger_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    /// Only ever goes false -> true
    pub is_resolved: bool,
    /// Only ever goes false -> true
    pub notification_sent: bool,
    /// Record whose condition raised this alert
    pub related_record_id: String,
    pub actions: Vec<String>,
}

impl HealthAlert {
    /// Key identifying the underlying condition.
    ///
    /// Two alerts with the same key describe the same condition, so the store
    /// keeps only the first.
    pub fn dedupe_key(&self) -> String {
        let due = self
            .due_date
            .map(|d| d.timestamp_millis().to_string())
            .unwrap_or_else(|| "-".to_string());
        format!("{}:{}:{}", self.alert_type.as_str(), self.related_record_id, due)
    }

    pub fn mark_notified(&mut self) {
        self.notification_sent = true;
    }

    pub fn mark_resolved(&mut self) {
        self.is_resolved = true;
    }

    /// Whether the alert still needs to be dispatched.
    pub fn awaiting_notification(&self) -> bool {
        !self.is_resolved && !self.notification_sent
    }
}

/// Listing order: higher severity first, then earlier due date, undated last.
pub fn compare_alerts(a: &HealthAlert, b: &HealthAlert) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Sort alerts in listing order.
pub fn sort_alerts(alerts: &mut [HealthAlert]) {
    alerts.sort_by(compare_alerts);
}
