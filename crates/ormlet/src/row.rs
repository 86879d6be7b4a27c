//! Result row representation.

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;

use crate::value::{row_to_values, Value};
use crate::Result;

/// A single row returned by `select`: column name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: HashMap<String, Value>,
}

impl Row {
    /// Creates a new row from a column map.
    pub fn new(columns: HashMap<String, Value>) -> Self {
        Self { columns }
    }

    /// Converts from a MySQL result row.
    pub fn from_mysql(row: &MySqlRow) -> Result<Self> {
        Ok(Self {
            columns: row_to_values(row)?,
        })
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Gets all column names.
    pub fn columns(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> HashMap<String, Value> {
        self.columns
    }

    /// Converts row to a JSON object.
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .columns
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        JsonValue::Object(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
