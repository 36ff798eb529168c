//! WHERE-clause assembly for repository queries.

use rusqlite::types::Value;

use super::to_db_time;
use crate::repository::{DateRange, SortOrder};

/// Accumulates `AND`-joined predicates with positional parameters.
#[derive(Debug, Default)]
pub(crate) struct Filter {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Filter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// `column = value`
    pub(crate) fn eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.clauses.push(format!("{} = ?", column));
        self.params.push(Value::Text(value.to_string()));
        self
    }

    /// `column = value` on an integer flag.
    pub(crate) fn flag(&mut self, column: &str, value: bool) -> &mut Self {
        self.clauses.push(format!("{} = ?", column));
        self.params.push(Value::Integer(value as i64));
        self
    }

    /// `column IN (...)`; `None` leaves the column unfiltered and an empty
    /// set matches nothing.
    pub(crate) fn in_set<I, S>(&mut self, column: &str, values: Option<I>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(values) = values else {
            return self;
        };

        let values: Vec<Value> = values
            .into_iter()
            .map(|v| Value::Text(v.as_ref().to_string()))
            .collect();

        if values.is_empty() {
            self.clauses.push("0".to_string());
            return self;
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{} IN ({})", column, placeholders));
        self.params.extend(values);
        self
    }

    /// Inclusive bounds on a timestamp column.
    pub(crate) fn range(&mut self, column: &str, range: &DateRange) -> &mut Self {
        if let Some(start) = &range.start {
            self.clauses.push(format!("{} >= ?", column));
            self.params.push(Value::Text(to_db_time(start)));
        }
        if let Some(end) = &range.end {
            self.clauses.push(format!("{} <= ?", column));
            self.params.push(Value::Text(to_db_time(end)));
        }
        self
    }

    /// Rendered `WHERE ...` (empty when no predicates).
    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> rusqlite::ParamsFromIter<std::slice::Iter<'_, Value>> {
        rusqlite::params_from_iter(self.params.iter())
    }
}

/// `ORDER BY` fragment for a date column; ties break on id for stable output.
pub(crate) fn order_by(column: &str, order: SortOrder) -> String {
    let direction = match order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    };
    format!("ORDER BY {} {}, id {}", column, direction, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_filter() {
        let filter = Filter::new();
        assert_eq!(filter.where_sql(), "");
    }

    #[test]
    fn test_combined_filter() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut filter = Filter::new();
        filter
            .in_set("bovine_id", Some(&["a".to_string(), "b".to_string()]))
            .eq("vaccine_id", "ibr")
            .range("administration_date", &DateRange { start: Some(start), end: None });

        assert_eq!(
            filter.where_sql(),
            "WHERE bovine_id IN (?, ?) AND vaccine_id = ? AND administration_date >= ?"
        );
        assert_eq!(filter.params.len(), 4);
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let mut filter = Filter::new();
        filter.in_set("bovine_id", Some(Vec::<String>::new()));
        assert_eq!(filter.where_sql(), "WHERE 0");
    }

    #[test]
    fn test_unset_filter_is_skipped() {
        let mut filter = Filter::new();
        filter.in_set("status", None::<Vec<String>>);
        assert_eq!(filter.where_sql(), "");
    }

    #[test]
    fn test_order_by() {
        assert_eq!(
            order_by("start_date", SortOrder::Ascending),
            "ORDER BY start_date ASC, id ASC"
        );
    }
}
