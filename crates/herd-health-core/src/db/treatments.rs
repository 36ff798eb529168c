//! Treatment plan database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::query::{order_by, Filter};
use super::{from_db_time, from_db_time_opt, to_db_time, Database, DbError, DbResult};
use crate::models::{MedicationLine, TreatmentPlan, TreatmentStatus};
use crate::repository::TreatmentQuery;

const TREATMENT_COLUMNS: &str = "id, bovine_id, diagnosis, medications, total_cost, status, \
     start_date, next_checkup, recorded_by, created_at, updated_at";

impl Database {
    /// Insert a new treatment plan.
    pub fn insert_treatment_plan(&self, plan: &TreatmentPlan) -> DbResult<()> {
        let medications_json = serde_json::to_string(&plan.medications)?;

        self.conn.execute(
            r#"
            INSERT INTO treatment_plans (
                id, bovine_id, diagnosis, medications, total_cost, status,
                start_date, next_checkup, recorded_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                plan.id,
                plan.bovine_id,
                plan.diagnosis,
                medications_json,
                plan.total_cost,
                plan.status.as_str(),
                to_db_time(&plan.start_date),
                plan.next_checkup.as_ref().map(to_db_time),
                plan.recorded_by,
                to_db_time(&plan.created_at),
                to_db_time(&plan.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Get a treatment plan by ID.
    pub fn get_treatment_plan(&self, id: &str) -> DbResult<Option<TreatmentPlan>> {
        let sql = format!("SELECT {} FROM treatment_plans WHERE id = ?", TREATMENT_COLUMNS);
        self.conn
            .query_row(&sql, [id], TreatmentRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Find treatment plans matching the query.
    pub fn find_treatment_plans(&self, query: &TreatmentQuery) -> DbResult<Vec<TreatmentPlan>> {
        let filter = treatment_filter(query);
        let sql = format!(
            "SELECT {} FROM treatment_plans {} {}",
            TREATMENT_COLUMNS,
            filter.where_sql(),
            order_by("start_date", query.order)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(filter.params(), TreatmentRow::from_row)?;

        let mut plans = Vec::new();
        for row in rows {
            plans.push(row?.try_into()?);
        }
        Ok(plans)
    }

    /// Count treatment plans matching the query.
    pub fn count_treatment_plans(&self, query: &TreatmentQuery) -> DbResult<usize> {
        let filter = treatment_filter(query);
        let sql = format!("SELECT COUNT(*) FROM treatment_plans {}", filter.where_sql());
        let count: i64 = self.conn.query_row(&sql, filter.params(), |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn treatment_filter(query: &TreatmentQuery) -> Filter {
    let mut filter = Filter::new();
    filter
        .in_set("bovine_id", query.bovine_ids.as_ref())
        .in_set(
            "status",
            query
                .statuses
                .as_ref()
                .map(|statuses| statuses.iter().map(|s| s.as_str())),
        )
        .range("start_date", &query.start_date)
        .range("next_checkup", &query.next_checkup);
    filter
}

/// Intermediate row struct for database mapping.
struct TreatmentRow {
    id: String,
    bovine_id: String,
    diagnosis: Option<String>,
    medications: String,
    total_cost: f64,
    status: String,
    start_date: String,
    next_checkup: Option<String>,
    recorded_by: String,
    created_at: String,
    updated_at: String,
}

impl TreatmentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            bovine_id: row.get(1)?,
            diagnosis: row.get(2)?,
            medications: row.get(3)?,
            total_cost: row.get(4)?,
            status: row.get(5)?,
            start_date: row.get(6)?,
            next_checkup: row.get(7)?,
            recorded_by: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl TryFrom<TreatmentRow> for TreatmentPlan {
    type Error = DbError;

    fn try_from(row: TreatmentRow) -> Result<Self, Self::Error> {
        let medications: Vec<MedicationLine> = serde_json::from_str(&row.medications)?;
        let status = TreatmentStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown treatment status: {}", row.status)))?;

        Ok(TreatmentPlan {
            id: row.id,
            bovine_id: row.bovine_id,
            diagnosis: row.diagnosis,
            medications,
            total_cost: row.total_cost,
            status,
            start_date: from_db_time(&row.start_date)?,
            next_checkup: from_db_time_opt(row.next_checkup)?,
            recorded_by: row.recorded_by,
            created_at: from_db_time(&row.created_at)?,
            updated_at: from_db_time(&row.updated_at)?,
        })
    }
}
