//! Engine events and the default log sink.

use std::fmt;

use log::{debug, info, warn};

use crate::error::ErrorKind;
use crate::models::{AlertSeverity, AlertType};

/// Something worth observing happened inside the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    RecordCreated {
        entity: &'static str,
        id: String,
        bovine_id: String,
    },
    ValidationRejected {
        operation: &'static str,
        bovine_id: String,
        kind: ErrorKind,
        reason: String,
    },
    AlertRaised {
        id: String,
        bovine_id: String,
        alert_type: AlertType,
        severity: AlertSeverity,
    },
    AlertDispatched {
        id: String,
        bovine_id: String,
    },
    VaccinationStatusChanged {
        id: String,
        status: &'static str,
    },
    /// A collaborator call failed; the surrounding operation carried on.
    DependencyFailed {
        dependency: &'static str,
        operation: &'static str,
        subject: String,
        error: String,
    },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::RecordCreated {
                entity,
                id,
                bovine_id,
            } => write!(
                f,
                "event=record_created entity={} id={} bovine_id={}",
                entity, id, bovine_id
            ),
            EngineEvent::ValidationRejected {
                operation,
                bovine_id,
                kind,
                reason,
            } => write!(
                f,
                "event=validation_rejected operation={} bovine_id={} kind={:?} reason={:?}",
                operation, bovine_id, kind, reason
            ),
            EngineEvent::AlertRaised {
                id,
                bovine_id,
                alert_type,
                severity,
            } => write!(
                f,
                "event=alert_raised id={} bovine_id={} type={} severity={}",
                id,
                bovine_id,
                alert_type.as_str(),
                severity.as_str()
            ),
            EngineEvent::AlertDispatched { id, bovine_id } => {
                write!(f, "event=alert_dispatched id={} bovine_id={}", id, bovine_id)
            }
            EngineEvent::VaccinationStatusChanged { id, status } => {
                write!(f, "event=vaccination_status id={} status={}", id, status)
            }
            EngineEvent::DependencyFailed {
                dependency,
                operation,
                subject,
                error,
            } => write!(
                f,
                "event=dependency_failed dependency={} operation={} subject={} error={:?}",
                dependency, operation, subject, error
            ),
        }
    }
}

/// Receives engine events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &EngineEvent);
}

/// Writes events through the `log` facade as `key=value` lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &EngineEvent) {
        match event {
            EngineEvent::RecordCreated { .. } | EngineEvent::AlertRaised { .. } => {
                info!("{}", event)
            }
            EngineEvent::ValidationRejected { .. } | EngineEvent::DependencyFailed { .. } => {
                warn!("{}", event)
            }
            EngineEvent::AlertDispatched { .. } | EngineEvent::VaccinationStatusChanged { .. } => {
                debug!("{}", event)
            }
        }
    }
}
