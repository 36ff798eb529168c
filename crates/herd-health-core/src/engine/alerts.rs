//! Alert materialization and dispatch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::error::Result;
use crate::events::{EngineEvent, EventSink};
use crate::ids::{EntityKind, IdGenerator};
use crate::models::{
    sort_alerts, AlertSeverity, AlertType, DiseaseRecord, HealthAlert, MedicalRecord,
    TreatmentPlan, TreatmentStatus, Vaccination, VaccinationStatus,
};
use crate::ports::Notifier;
use crate::repository::{AlertQuery, DateRange, HealthRepository, TreatmentQuery, VaccinationQuery};

/// An alert before it has an id and a trigger date.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub bovine_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub details: serde_json::Value,
    pub due_date: Option<DateTime<Utc>>,
    pub related_record_id: String,
    pub actions: Vec<String>,
}

fn actions(items: &[&str]) -> Vec<String> {
    items.iter().map(|a| a.to_string()).collect()
}

impl AlertDraft {
    pub fn vaccination_due(vaccination: &Vaccination, due_date: DateTime<Utc>) -> Self {
        Self {
            bovine_id: vaccination.bovine_id.clone(),
            alert_type: AlertType::VaccinationDue,
            severity: AlertSeverity::High,
            message: format!(
                "{} vaccination due for bovine {}",
                vaccination.vaccine_name, vaccination.bovine_id
            ),
            details: json!({
                "vaccine_id": vaccination.vaccine_id,
                "vaccine_name": vaccination.vaccine_name,
                "last_administered": vaccination.administration_date,
            }),
            due_date: Some(due_date),
            related_record_id: vaccination.id.clone(),
            actions: actions(&["schedule vaccination", "contact veterinarian"]),
        }
    }

    pub fn treatment_overdue(plan: &TreatmentPlan, checkup: DateTime<Utc>) -> Self {
        Self {
            bovine_id: plan.bovine_id.clone(),
            alert_type: AlertType::TreatmentOverdue,
            severity: AlertSeverity::Medium,
            message: format!("Treatment checkup overdue for bovine {}", plan.bovine_id),
            details: json!({
                "diagnosis": plan.diagnosis,
                "started": plan.start_date,
            }),
            due_date: Some(checkup),
            related_record_id: plan.id.clone(),
            actions: actions(&["assess progress", "adjust treatment"]),
        }
    }

    pub fn treatment_follow_up(plan: &TreatmentPlan, checkup: DateTime<Utc>) -> Self {
        Self {
            bovine_id: plan.bovine_id.clone(),
            alert_type: AlertType::TreatmentFollowUp,
            severity: AlertSeverity::Low,
            message: format!("Treatment checkup scheduled for bovine {}", plan.bovine_id),
            details: json!({
                "diagnosis": plan.diagnosis,
                "total_cost": plan.total_cost,
            }),
            due_date: Some(checkup),
            related_record_id: plan.id.clone(),
            actions: actions(&["schedule checkup"]),
        }
    }

    pub fn emergency_consultation(record: &MedicalRecord) -> Self {
        Self {
            bovine_id: record.bovine_id.clone(),
            alert_type: AlertType::EmergencyConsultation,
            severity: AlertSeverity::High,
            message: format!("Emergency consultation recorded for bovine {}", record.bovine_id),
            details: json!({
                "diagnosis": record.diagnosis,
                "consultation_date": record.consultation_date,
            }),
            due_date: None,
            related_record_id: record.id.clone(),
            actions: actions(&["review emergency treatment", "monitor vital signs"]),
        }
    }

    pub fn post_surgery_check(record: &MedicalRecord, due_date: DateTime<Utc>) -> Self {
        Self {
            bovine_id: record.bovine_id.clone(),
            alert_type: AlertType::PostSurgeryCheck,
            severity: AlertSeverity::Medium,
            message: format!("Post-surgery check due for bovine {}", record.bovine_id),
            details: json!({
                "diagnosis": record.diagnosis,
                "surgery_date": record.consultation_date,
            }),
            due_date: Some(due_date),
            related_record_id: record.id.clone(),
            actions: actions(&["inspect surgical site", "check for infection"]),
        }
    }

    pub fn health_deterioration(record: &DiseaseRecord) -> Self {
        Self {
            bovine_id: record.bovine_id.clone(),
            alert_type: AlertType::HealthDeterioration,
            severity: AlertSeverity::Critical,
            message: format!(
                "Critical {} case detected in bovine {}",
                record.disease_name, record.bovine_id
            ),
            details: json!({
                "disease_name": record.disease_name,
                "is_contagious": record.is_contagious,
                "quarantine_required": record.quarantine_required,
            }),
            due_date: None,
            related_record_id: record.id.clone(),
            actions: actions(&["isolate animal", "contact veterinarian immediately"]),
        }
    }
}

/// Turns overdue conditions into stored alerts and sends them out.
pub struct AlertEngine {
    repository: Arc<dyn HealthRepository>,
    notifier: Arc<dyn Notifier>,
    ids: Arc<dyn IdGenerator>,
    events: Arc<dyn EventSink>,
}

impl AlertEngine {
    pub fn new(
        repository: Arc<dyn HealthRepository>,
        notifier: Arc<dyn Notifier>,
        ids: Arc<dyn IdGenerator>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            repository,
            notifier,
            ids,
            events,
        }
    }

    /// Store an alert unless the same condition was already raised.
    ///
    /// Returns `None` when an alert with the same dedupe key exists.
    pub fn raise(&self, draft: AlertDraft, now: DateTime<Utc>) -> Result<Option<HealthAlert>> {
        let alert = HealthAlert {
            id: self.ids.generate(EntityKind::Alert),
            bovine_id: draft.bovine_id,
            alert_type: draft.alert_type,
            severity: draft.severity,
            message: draft.message,
            details: draft.details,
            trigger_date: now,
            due_date: draft.due_date,
            is_resolved: false,
            notification_sent: false,
            related_record_id: draft.related_record_id,
            actions: draft.actions,
        };

        if !self.repository.insert_alert(&alert)? {
            return Ok(None);
        }

        self.events.emit(&EngineEvent::AlertRaised {
            id: alert.id.clone(),
            bovine_id: alert.bovine_id.clone(),
            alert_type: alert.alert_type,
            severity: alert.severity,
        });
        Ok(Some(alert))
    }

    /// Raise and immediately try to deliver.
    pub fn raise_and_dispatch(
        &self,
        draft: AlertDraft,
        now: DateTime<Utc>,
    ) -> Result<Option<HealthAlert>> {
        let mut alert = self.raise(draft, now)?;
        if let Some(alert) = alert.as_mut() {
            if self.dispatch(alert) {
                alert.mark_notified();
            }
        }
        Ok(alert)
    }

    /// Send one alert and flag it as notified.
    ///
    /// Returns whether both steps succeeded. Failures are reported as events
    /// and leave the alert pending for the next scan.
    pub fn dispatch(&self, alert: &HealthAlert) -> bool {
        if let Err(e) = self.notifier.send_health_alert(alert) {
            self.events.emit(&EngineEvent::DependencyFailed {
                dependency: "notifier",
                operation: "send_health_alert",
                subject: alert.id.clone(),
                error: e.to_string(),
            });
            return false;
        }

        match self.repository.mark_alert_notified(&alert.id) {
            Ok(_) => {
                self.events.emit(&EngineEvent::AlertDispatched {
                    id: alert.id.clone(),
                    bovine_id: alert.bovine_id.clone(),
                });
                true
            }
            Err(e) => {
                self.events.emit(&EngineEvent::DependencyFailed {
                    dependency: "repository",
                    operation: "mark_alert_notified",
                    subject: alert.id.clone(),
                    error: e.to_string(),
                });
                false
            }
        }
    }

    /// Scan the given animals for overdue follow-ups.
    ///
    /// Returns the alerts this run created, in listing order. Every pending
    /// alert of these animals is dispatched, including ones left over from an
    /// interrupted run, so the scan can be repeated safely.
    pub fn scan(&self, bovine_ids: &[String], now: DateTime<Utc>) -> Result<Vec<HealthAlert>> {
        let mut created = Vec::new();

        let due_vaccinations = self.repository.find_vaccinations(
            &VaccinationQuery::for_bovines(bovine_ids)
                .with_statuses(&[VaccinationStatus::Scheduled])
                .due(DateRange::up_to(now)),
        )?;
        for vaccination in &due_vaccinations {
            let Some(due) = vaccination.next_due_date else {
                continue;
            };
            if let Some(alert) = self.raise(AlertDraft::vaccination_due(vaccination, due), now)? {
                created.push(alert);
            }
            if self
                .repository
                .update_vaccination_status(&vaccination.id, VaccinationStatus::Overdue)?
            {
                self.events.emit(&EngineEvent::VaccinationStatusChanged {
                    id: vaccination.id.clone(),
                    status: VaccinationStatus::Overdue.as_str(),
                });
            }
        }

        let overdue_treatments = self.repository.find_treatment_plans(
            &TreatmentQuery::for_bovines(bovine_ids)
                .with_statuses(&[TreatmentStatus::Active])
                .checkup(DateRange::up_to(now)),
        )?;
        for plan in &overdue_treatments {
            let Some(checkup) = plan.next_checkup else {
                continue;
            };
            if let Some(alert) = self.raise(AlertDraft::treatment_overdue(plan, checkup), now)? {
                created.push(alert);
            }
        }

        let notified = self.dispatch_pending(bovine_ids)?;
        for alert in created.iter_mut() {
            if notified.contains(&alert.id) {
                alert.mark_notified();
            }
        }

        sort_alerts(&mut created);
        Ok(created)
    }

    /// Dispatch every unresolved, unsent alert of the given animals.
    ///
    /// Returns the ids that went out.
    pub fn dispatch_pending(&self, bovine_ids: &[String]) -> Result<HashSet<String>> {
        let pending = self
            .repository
            .find_alerts(&AlertQuery::for_bovines(bovine_ids).pending_notification())?;

        Ok(pending
            .iter()
            .filter(|alert| alert.awaiting_notification() && self.dispatch(alert))
            .map(|alert| alert.id.clone())
            .collect())
    }
}
