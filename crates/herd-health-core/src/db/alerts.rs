//! Health alert database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::query::{order_by, Filter};
use super::{from_db_time, from_db_time_opt, to_db_time, Database, DbError, DbResult};
use crate::models::{AlertSeverity, AlertType, HealthAlert};
use crate::repository::AlertQuery;

const ALERT_COLUMNS: &str = "id, bovine_id, alert_type, severity, message, details, trigger_date, \
     due_date, is_resolved, notification_sent, related_record_id, actions";

impl Database {
    /// Insert an alert unless one with the same dedupe key exists.
    ///
    /// Returns whether a row was written.
    pub fn insert_alert(&self, alert: &HealthAlert) -> DbResult<bool> {
        let details_json = serde_json::to_string(&alert.details)?;
        let actions_json = serde_json::to_string(&alert.actions)?;

        let rows_affected = self.conn.execute(
            r#"
            INSERT INTO health_alerts (
                id, dedupe_key, bovine_id, alert_type, severity, message, details,
                trigger_date, due_date, is_resolved, notification_sent,
                related_record_id, actions
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(dedupe_key) DO NOTHING
            "#,
            params![
                alert.id,
                alert.dedupe_key(),
                alert.bovine_id,
                alert.alert_type.as_str(),
                alert.severity.as_str(),
                alert.message,
                details_json,
                to_db_time(&alert.trigger_date),
                alert.due_date.as_ref().map(to_db_time),
                alert.is_resolved,
                alert.notification_sent,
                alert.related_record_id,
                actions_json,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an alert by ID.
    pub fn get_alert(&self, id: &str) -> DbResult<Option<HealthAlert>> {
        let sql = format!("SELECT {} FROM health_alerts WHERE id = ?", ALERT_COLUMNS);
        self.conn
            .query_row(&sql, [id], AlertRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Find alerts matching the query.
    pub fn find_alerts(&self, query: &AlertQuery) -> DbResult<Vec<HealthAlert>> {
        let mut filter = Filter::new();
        filter.in_set("bovine_id", query.bovine_ids.as_ref());
        if !query.include_resolved || query.pending_notification {
            filter.flag("is_resolved", false);
        }
        if query.pending_notification {
            filter.flag("notification_sent", false);
        }

        let sql = format!(
            "SELECT {} FROM health_alerts {} {}",
            ALERT_COLUMNS,
            filter.where_sql(),
            order_by("trigger_date", query.order)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(filter.params(), AlertRow::from_row)?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?.try_into()?);
        }
        Ok(alerts)
    }

    /// Record that the alert's notification went out.
    pub fn mark_alert_notified(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE health_alerts SET notification_sent = 1 WHERE id = ?",
            [id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Mark an alert resolved.
    pub fn resolve_alert(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("UPDATE health_alerts SET is_resolved = 1 WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct AlertRow {
    id: String,
    bovine_id: String,
    alert_type: String,
    severity: String,
    message: String,
    details: String,
    trigger_date: String,
    due_date: Option<String>,
    is_resolved: bool,
    notification_sent: bool,
    related_record_id: String,
    actions: String,
}

impl AlertRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            bovine_id: row.get(1)?,
            alert_type: row.get(2)?,
            severity: row.get(3)?,
            message: row.get(4)?,
            details: row.get(5)?,
            trigger_date: row.get(6)?,
            due_date: row.get(7)?,
            is_resolved: row.get(8)?,
            notification_sent: row.get(9)?,
            related_record_id: row.get(10)?,
            actions: row.get(11)?,
        })
    }
}

impl TryFrom<AlertRow> for HealthAlert {
    type Error = DbError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let alert_type = AlertType::parse(&row.alert_type)
            .ok_or_else(|| DbError::Constraint(format!("Unknown alert type: {}", row.alert_type)))?;
        let severity = AlertSeverity::parse(&row.severity)
            .ok_or_else(|| DbError::Constraint(format!("Unknown alert severity: {}", row.severity)))?;

        Ok(HealthAlert {
            id: row.id,
            bovine_id: row.bovine_id,
            alert_type,
            severity,
            message: row.message,
            details: serde_json::from_str(&row.details)?,
            trigger_date: from_db_time(&row.trigger_date)?,
            due_date: from_db_time_opt(row.due_date)?,
            is_resolved: row.is_resolved,
            notification_sent: row.notification_sent,
            related_record_id: row.related_record_id,
            actions: serde_json::from_str(&row.actions)?,
        })
    }
}
