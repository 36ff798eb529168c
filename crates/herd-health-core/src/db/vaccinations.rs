//! Vaccination database operations.

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::query::{order_by, Filter};
use super::{from_db_time, from_db_time_opt, to_db_time, Database, DbError, DbResult};
use crate::models::{GeoLocation, Vaccination, VaccinationStatus};
use crate::repository::{DateRange, VaccinationInsert, VaccinationQuery};

const VACCINATION_COLUMNS: &str = "id, bovine_id, vaccine_id, vaccine_name, administration_date, \
     location, dose_quantity, batch_number, next_due_date, status, recorded_by, created_at";

impl Database {
    /// Insert a vaccination unless the same animal already received the same
    /// vaccine inside `lookback`.
    ///
    /// Runs as an IMMEDIATE transaction: the write lock is taken before the
    /// lookup, so no other connection can insert between check and write.
    pub fn insert_vaccination_unique(
        &mut self,
        vaccination: &Vaccination,
        lookback: &DateRange,
    ) -> DbResult<VaccinationInsert> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut filter = Filter::new();
        filter
            .eq("bovine_id", &vaccination.bovine_id)
            .eq("vaccine_id", &vaccination.vaccine_id)
            .range("administration_date", lookback);
        let sql = format!(
            "SELECT id, administration_date FROM vaccinations {} ORDER BY administration_date DESC LIMIT 1",
            filter.where_sql()
        );

        let existing: Option<(String, String)> = tx
            .query_row(&sql, filter.params(), |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        if let Some((existing_id, administered)) = existing {
            // Nothing written; dropping the transaction rolls it back
            return Ok(VaccinationInsert::Duplicate {
                existing_id,
                administration_date: from_db_time(&administered)?,
            });
        }

        insert_vaccination_row(&tx, vaccination)?;
        tx.commit()?;
        Ok(VaccinationInsert::Inserted)
    }

    /// Get a vaccination by ID.
    pub fn get_vaccination(&self, id: &str) -> DbResult<Option<Vaccination>> {
        let sql = format!("SELECT {} FROM vaccinations WHERE id = ?", VACCINATION_COLUMNS);
        self.conn
            .query_row(&sql, [id], VaccinationRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Find vaccinations matching the query.
    pub fn find_vaccinations(&self, query: &VaccinationQuery) -> DbResult<Vec<Vaccination>> {
        let filter = vaccination_filter(query);
        let sql = format!(
            "SELECT {} FROM vaccinations {} {}",
            VACCINATION_COLUMNS,
            filter.where_sql(),
            order_by("administration_date", query.order)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(filter.params(), VaccinationRow::from_row)?;

        let mut vaccinations = Vec::new();
        for row in rows {
            vaccinations.push(row?.try_into()?);
        }
        Ok(vaccinations)
    }

    /// Count vaccinations matching the query.
    pub fn count_vaccinations(&self, query: &VaccinationQuery) -> DbResult<usize> {
        let filter = vaccination_filter(query);
        let sql = format!("SELECT COUNT(*) FROM vaccinations {}", filter.where_sql());
        let count: i64 = self.conn.query_row(&sql, filter.params(), |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Advance a vaccination's follow-up status.
    pub fn update_vaccination_status(&self, id: &str, status: VaccinationStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE vaccinations SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        Ok(rows_affected > 0)
    }
}

fn insert_vaccination_row(conn: &Connection, vaccination: &Vaccination) -> DbResult<()> {
    let location_json = serde_json::to_string(&vaccination.location)?;

    conn.execute(
        r#"
        INSERT INTO vaccinations (
            id, bovine_id, vaccine_id, vaccine_name, administration_date,
            location, dose_quantity, batch_number, next_due_date, status,
            recorded_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            vaccination.id,
            vaccination.bovine_id,
            vaccination.vaccine_id,
            vaccination.vaccine_name,
            to_db_time(&vaccination.administration_date),
            location_json,
            vaccination.dose_quantity,
            vaccination.batch_number,
            vaccination.next_due_date.as_ref().map(to_db_time),
            vaccination.status.as_str(),
            vaccination.recorded_by,
            to_db_time(&vaccination.created_at),
        ],
    )?;
    Ok(())
}

fn vaccination_filter(query: &VaccinationQuery) -> Filter {
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
        .range("administration_date", &query.administration_date)
        .range("next_due_date", &query.next_due_date);
    if let Some(vaccine_id) = &query.vaccine_id {
        filter.eq("vaccine_id", vaccine_id);
    }
    filter
}

/// Intermediate row struct for database mapping.
struct VaccinationRow {
    id: String,
    bovine_id: String,
    vaccine_id: String,
    vaccine_name: String,
    administration_date: String,
    location: String,
    dose_quantity: f64,
    batch_number: Option<String>,
    next_due_date: Option<String>,
    status: String,
    recorded_by: String,
    created_at: String,
}

impl VaccinationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            bovine_id: row.get(1)?,
            vaccine_id: row.get(2)?,
            vaccine_name: row.get(3)?,
            administration_date: row.get(4)?,
            location: row.get(5)?,
            dose_quantity: row.get(6)?,
            batch_number: row.get(7)?,
            next_due_date: row.get(8)?,
            status: row.get(9)?,
            recorded_by: row.get(10)?,
            created_at: row.get(11)?,
        })
    }
}

impl TryFrom<VaccinationRow> for Vaccination {
    type Error = DbError;

    fn try_from(row: VaccinationRow) -> Result<Self, Self::Error> {
        let status = VaccinationStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown vaccination status: {}", row.status)))?;
        let location: GeoLocation = serde_json::from_str(&row.location)?;

        Ok(Vaccination {
            id: row.id,
            bovine_id: row.bovine_id,
            vaccine_id: row.vaccine_id,
            vaccine_name: row.vaccine_name,
            administration_date: from_db_time(&row.administration_date)?,
            location,
            dose_quantity: row.dose_quantity,
            batch_number: row.batch_number,
            next_due_date: from_db_time_opt(row.next_due_date)?,
            status,
            recorded_by: row.recorded_by,
            created_at: from_db_time(&row.created_at)?,
        })
    }
}
