//! Table schema and row storage.

use std::collections::HashSet;

use serde_json::Map;

use crate::error::StoreError;
use crate::record::{Record, Value};

/// Name of the identity column every table must carry.
pub const ID_COLUMN: &str = "id";

/// The in-memory table: column schema plus rows in load order.
///
/// Invariants:
/// - `id` values are pairwise distinct at all times
/// - every row carries exactly the schema columns minus `id`, in order
/// - delete shifts later rows left; update preserves row position
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Creates an empty table with the given column schema.
    ///
    /// The column list must contain an `id` column and no duplicates.
    pub fn new(columns: Vec<String>) -> Result<Self, StoreError> {
        if !columns.iter().any(|c| c == ID_COLUMN) {
            return Err(StoreError::Malformed(
                "header has no 'id' column".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(StoreError::Malformed(format!(
                    "duplicate column '{}'",
                    column
                )));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Column names in schema order, `id` included.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in current order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns a snapshot copy of every row in current order.
    pub fn all(&self) -> Vec<Record> {
        self.rows.clone()
    }

    /// Finds a record by id. Linear scan, O(n).
    pub fn get(&self, id: i64) -> Result<Record, StoreError> {
        self.rows
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::RecordNotFound { id })
    }

    /// Column names excluding `id`, in schema order.
    pub fn field_columns(&self) -> impl Iterator<Item = &String> {
        self.columns.iter().filter(|c| c.as_str() != ID_COLUMN)
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    fn next_id(&self) -> i64 {
        self.rows.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    /// Appends a row produced by the loader, enforcing id uniqueness.
    pub(crate) fn push_loaded(&mut self, record: Record) -> Result<(), StoreError> {
        if self.position(record.id).is_some() {
            return Err(StoreError::Malformed(format!(
                "duplicate id {}",
                record.id
            )));
        }
        self.rows.push(record);
        Ok(())
    }

    /// Appends a new record with id = max(id) + 1, or 1 when empty.
    ///
    /// The submitted keys must cover the schema columns exactly; `id`
    /// is assigned here and must not be supplied.
    pub fn insert(
        &mut self,
        fields: &Map<String, serde_json::Value>,
    ) -> Result<Record, StoreError> {
        for key in fields.keys() {
            if key == ID_COLUMN || !self.columns.iter().any(|c| c == key) {
                return Err(StoreError::UnknownField { field: key.clone() });
            }
        }
        let mut values = Vec::with_capacity(self.columns.len().saturating_sub(1));
        for column in self.field_columns() {
            let raw = fields
                .get(column)
                .ok_or_else(|| StoreError::MissingField {
                    field: column.clone(),
                })?;
            values.push((column.clone(), Value::from_json(column, raw)?));
        }
        let record = Record {
            id: self.next_id(),
            fields: values,
        };
        self.rows.push(record.clone());
        Ok(record)
    }

    /// Overwrites the submitted fields on the matching row.
    ///
    /// An `id` key is silently ignored, never an error; keys outside
    /// the schema are ignored as well. Row position is preserved.
    pub fn update(
        &mut self,
        id: i64,
        partial: &Map<String, serde_json::Value>,
    ) -> Result<Record, StoreError> {
        let pos = self.position(id).ok_or(StoreError::RecordNotFound { id })?;
        let mut updated = self.rows[pos].clone();
        for (key, raw) in partial {
            if key == ID_COLUMN {
                continue;
            }
            if let Some(slot) = updated.fields.iter_mut().find(|(name, _)| name == key) {
                slot.1 = Value::from_json(key, raw)?;
            }
        }
        self.rows[pos] = updated.clone();
        Ok(updated)
    }

    /// Removes the matching row, preserving the relative order of the
    /// remainder.
    pub fn delete(&mut self, id: i64) -> Result<Record, StoreError> {
        let pos = self.position(id).ok_or(StoreError::RecordNotFound { id })?;
        Ok(self.rows.remove(pos))
    }
}
