//! Disease record database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::query::{order_by, Filter};
use super::{from_db_time, from_db_time_opt, to_db_time, Database, DbError, DbResult};
use crate::models::{DiseaseRecord, DiseaseSeverity, DiseaseStatus};
use crate::repository::DiseaseQuery;

const DISEASE_COLUMNS: &str = "id, bovine_id, disease_name, severity, status, detection_date, \
     is_contagious, is_reportable, quarantine_required, quarantine_end_date, recorded_by, \
     created_at, updated_at";

impl Database {
    /// Insert a new disease record.
    pub fn insert_disease_record(&self, record: &DiseaseRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO disease_records (
                id, bovine_id, disease_name, severity, status, detection_date,
                is_contagious, is_reportable, quarantine_required, quarantine_end_date,
                recorded_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.id,
                record.bovine_id,
                record.disease_name,
                record.severity.as_str(),
                record.status.as_str(),
                to_db_time(&record.detection_date),
                record.is_contagious,
                record.is_reportable,
                record.quarantine_required,
                record.quarantine_end_date.as_ref().map(to_db_time),
                record.recorded_by,
                to_db_time(&record.created_at),
                to_db_time(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Get a disease record by ID.
    pub fn get_disease_record(&self, id: &str) -> DbResult<Option<DiseaseRecord>> {
        let sql = format!("SELECT {} FROM disease_records WHERE id = ?", DISEASE_COLUMNS);
        self.conn
            .query_row(&sql, [id], DiseaseRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Find disease records matching the query.
    pub fn find_disease_records(&self, query: &DiseaseQuery) -> DbResult<Vec<DiseaseRecord>> {
        let filter = disease_filter(query);
        let sql = format!(
            "SELECT {} FROM disease_records {} {}",
            DISEASE_COLUMNS,
            filter.where_sql(),
            order_by("detection_date", query.order)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(filter.params(), DiseaseRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Count disease records matching the query.
    pub fn count_disease_records(&self, query: &DiseaseQuery) -> DbResult<usize> {
        let filter = disease_filter(query);
        let sql = format!("SELECT COUNT(*) FROM disease_records {}", filter.where_sql());
        let count: i64 = self.conn.query_row(&sql, filter.params(), |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn disease_filter(query: &DiseaseQuery) -> Filter {
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
        .range("detection_date", &query.detection_date);
    filter
}

/// Intermediate row struct for database mapping.
struct DiseaseRow {
    id: String,
    bovine_id: String,
    disease_name: String,
    severity: String,
    status: String,
    detection_date: String,
    is_contagious: bool,
    is_reportable: bool,
    quarantine_required: bool,
    quarantine_end_date: Option<String>,
    recorded_by: String,
    created_at: String,
    updated_at: String,
}

impl DiseaseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            bovine_id: row.get(1)?,
            disease_name: row.get(2)?,
            severity: row.get(3)?,
            status: row.get(4)?,
            detection_date: row.get(5)?,
            is_contagious: row.get(6)?,
            is_reportable: row.get(7)?,
            quarantine_required: row.get(8)?,
            quarantine_end_date: row.get(9)?,
            recorded_by: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

impl TryFrom<DiseaseRow> for DiseaseRecord {
    type Error = DbError;

    fn try_from(row: DiseaseRow) -> Result<Self, Self::Error> {
        let severity = DiseaseSeverity::parse(&row.severity)
            .ok_or_else(|| DbError::Constraint(format!("Unknown disease severity: {}", row.severity)))?;
        let status = DiseaseStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown disease status: {}", row.status)))?;

        Ok(DiseaseRecord {
            id: row.id,
            bovine_id: row.bovine_id,
            disease_name: row.disease_name,
            severity,
            status,
            detection_date: from_db_time(&row.detection_date)?,
            is_contagious: row.is_contagious,
            is_reportable: row.is_reportable,
            quarantine_required: row.quarantine_required,
            quarantine_end_date: from_db_time_opt(row.quarantine_end_date)?,
            recorded_by: row.recorded_by,
            created_at: from_db_time(&row.created_at)?,
            updated_at: from_db_time(&row.updated_at)?,
        })
    }
}
