//! Medical record database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::query::{order_by, Filter};
use super::{from_db_time, to_db_time, Database, DbError, DbResult};
use crate::models::{ConsultationType, GeoLocation, MedicalRecord, Medication};
use crate::repository::RecordQuery;

const RECORD_COLUMNS: &str = "id, bovine_id, consultation_type, consultation_date, location, \
     diagnosis, notes, recorded_by, created_at, updated_at";

impl Database {
    /// Insert a medical record header. Medication lines are stored separately.
    pub fn insert_medical_record(&self, record: &MedicalRecord) -> DbResult<()> {
        let location_json = record
            .location
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            r#"
            INSERT INTO medical_records (
                id, bovine_id, consultation_type, consultation_date, location,
                diagnosis, notes, recorded_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.id,
                record.bovine_id,
                record.consultation_type.as_str(),
                to_db_time(&record.consultation_date),
                location_json,
                record.diagnosis,
                record.notes,
                record.recorded_by,
                to_db_time(&record.created_at),
                to_db_time(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    /// Insert one applied medication line.
    pub fn insert_record_medication(&self, medication: &Medication) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO record_medications (health_record_id, medication_id, dosage, cost)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                medication.health_record_id,
                medication.medication_id,
                medication.dosage,
                medication.cost,
            ],
        )?;
        Ok(())
    }

    /// Get a medical record with its medication lines.
    pub fn get_medical_record(&self, id: &str) -> DbResult<Option<MedicalRecord>> {
        let sql = format!("SELECT {} FROM medical_records WHERE id = ?", RECORD_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], RecordRow::from_row)
            .optional()?;

        match row {
            Some(row) => {
                let medications = self.list_record_medications(&row.id)?;
                Ok(Some(row.into_record(medications)?))
            }
            None => Ok(None),
        }
    }

    /// Find medical records matching the query, medication lines included.
    pub fn find_medical_records(&self, query: &RecordQuery) -> DbResult<Vec<MedicalRecord>> {
        let filter = record_filter(query);
        let sql = format!(
            "SELECT {} FROM medical_records {} {}",
            RECORD_COLUMNS,
            filter.where_sql(),
            order_by("consultation_date", query.order)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(filter.params(), RecordRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            let row = row?;
            let medications = self.list_record_medications(&row.id)?;
            records.push(row.into_record(medications)?);
        }
        Ok(records)
    }

    /// Medication lines of one record, in insertion order.
    pub fn list_record_medications(&self, health_record_id: &str) -> DbResult<Vec<Medication>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT health_record_id, medication_id, dosage, cost
            FROM record_medications
            WHERE health_record_id = ?
            ORDER BY line_id
            "#,
        )?;

        let rows = stmt.query_map([health_record_id], |row| {
            Ok(Medication {
                health_record_id: row.get(0)?,
                medication_id: row.get(1)?,
                dosage: row.get(2)?,
                cost: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn record_filter(query: &RecordQuery) -> Filter {
    let mut filter = Filter::new();
    filter
        .in_set("bovine_id", query.bovine_ids.as_ref())
        .range("consultation_date", &query.consultation_date);
    filter
}

/// Intermediate row struct for database mapping.
struct RecordRow {
    id: String,
    bovine_id: String,
    consultation_type: String,
    consultation_date: String,
    location: Option<String>,
    diagnosis: Option<String>,
    notes: Option<String>,
    recorded_by: String,
    created_at: String,
    updated_at: String,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            bovine_id: row.get(1)?,
            consultation_type: row.get(2)?,
            consultation_date: row.get(3)?,
            location: row.get(4)?,
            diagnosis: row.get(5)?,
            notes: row.get(6)?,
            recorded_by: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_record(self, medications: Vec<Medication>) -> DbResult<MedicalRecord> {
        let consultation_type = ConsultationType::parse(&self.consultation_type).ok_or_else(|| {
            DbError::Constraint(format!("Unknown consultation type: {}", self.consultation_type))
        })?;
        let location: Option<GeoLocation> = self
            .location
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(MedicalRecord {
            id: self.id,
            bovine_id: self.bovine_id,
            consultation_type,
            consultation_date: from_db_time(&self.consultation_date)?,
            location,
            diagnosis: self.diagnosis,
            notes: self.notes,
            medications,
            recorded_by: self.recorded_by,
            created_at: from_db_time(&self.created_at)?,
            updated_at: from_db_time(&self.updated_at)?,
        })
    }
}
