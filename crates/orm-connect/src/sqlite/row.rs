use orm_core::Value;

use crate::error::{ConnectError, Result};
use crate::sqlite::value_conv::value_from_rusqlite;
use crate::traits::Row;

/// Owned snapshot of a single `rusqlite` row, decoupled from the
/// statement's lifetime so it can cross the `visit` callback boundary.
pub(crate) struct SqliteRow {
    names: Vec<String>,
    values: Vec<Value>,
}

impl SqliteRow {
    pub(crate) fn from_rusqlite(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let names: Vec<String> = row
            .as_ref()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let values = (0..names.len())
            .map(|i| row.get_ref(i).map(value_from_rusqlite))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(SqliteRow { names, values })
    }
}

impl Row for SqliteRow {
    fn column_count(&self) -> usize {
        self.values.len()
    }

    fn value_at(&self, index: usize) -> Result<Value> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| ConnectError::ColumnNotFound(index.to_string()))
    }

    fn value_by_name(&self, name: &str) -> Result<Value> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i).cloned())
            .ok_or_else(|| ConnectError::ColumnNotFound(name.to_string()))
    }
}
