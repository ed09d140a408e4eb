//! Name-indexed view of a result row.
//!
//! Status commands return a column set that varies with server variant and
//! version, both in membership and in order. `NamedRow` resolves columns by
//! name so scrapers never depend on position, and exposes every value as raw
//! text so an a-priori-unknown schema can still be mapped onto metrics.

use crate::collectors::util;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row};
use std::collections::HashMap;

/// One result row, indexed by column name.
pub struct NamedRow {
    columns: Vec<String>,
    values: HashMap<String, String>,
}

impl NamedRow {
    /// Build a row from explicit columns and values; `None` marks SQL NULL.
    ///
    /// Columns without a value behave exactly like absent columns.
    #[must_use]
    pub fn new(columns: Vec<String>, values: Vec<Option<String>>) -> Self {
        let mut map = HashMap::with_capacity(columns.len());
        for (column, value) in columns.iter().zip(values) {
            if let Some(value) = value {
                map.insert(column.clone(), value);
            }
        }

        Self {
            columns,
            values: map,
        }
    }

    /// Build a row from a driver row, rendering every value as text.
    ///
    /// The driver reports values in the column's wire type; numeric types
    /// are re-rendered as their decimal text so `number` can parse them
    /// uniformly. Values no decode attempt understands are treated as NULL.
    #[must_use]
    pub fn from_mysql(row: &MySqlRow) -> Self {
        let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        let values = (0..columns.len()).map(|idx| raw_text(row, idx)).collect();

        Self::new(columns, values)
    }

    /// Column names in result order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The raw text value of a column; empty if the column is absent or NULL.
    #[must_use]
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map_or("", String::as_str)
    }

    /// The column's value interpreted as a number; `None` if the column is
    /// absent, NULL, or not numeric. Callers skip `None` silently.
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        self.values.get(column).and_then(|v| util::parse_number(v))
    }
}

fn raw_text(row: &MySqlRow, idx: usize) -> Option<String> {
    if let Ok(value) = row.try_get::<Option<String>, _>(idx) {
        return value;
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(idx) {
        return value.map(|v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(idx) {
        return value.map(|v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(idx) {
        return value.map(|v| v.to_string());
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return value.map(|v| String::from_utf8_lossy(&v).into_owned());
    }

    None
}
