//! In-memory driver for integration tests.
//!
//! Understands exactly the statement shapes the mapping engine emits
//! (synthesized insert/update/delete, select by key, plain select with an
//! optional limit, aggregate count) and records every call it receives.

#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use ormlet::{Driver, OrmError, PlaceholderStyle, Result, Row, Value, AGGREGATE_ALIAS};
use parking_lot::{Mutex, RwLock};

type Record = HashMap<String, Value>;

#[derive(Debug)]
pub struct MemoryDriver {
    style: PlaceholderStyle,
    tables: RwLock<HashMap<String, Vec<Record>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    fetch_limits: Mutex<Vec<Option<usize>>>,
    fail_next: Mutex<Option<OrmError>>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::with_style(PlaceholderStyle::QuestionMark)
    }
}

impl MemoryDriver {
    pub fn with_style(style: PlaceholderStyle) -> Self {
        Self {
            style,
            tables: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fetch_limits: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// Statements received so far, as the driver saw them.
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<(String, Vec<Value>)> {
        self.calls.lock().last().cloned()
    }

    /// Row limit passed with the most recent query.
    pub fn last_fetch_limit(&self) -> Option<Option<usize>> {
        self.fetch_limits.lock().last().copied()
    }

    /// Makes the next statement fail with `error`.
    pub fn fail_next(&self, error: OrmError) {
        *self.fail_next.lock() = Some(error);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }

    fn record(&self, sql: &str, params: &[Value]) -> Result<()> {
        self.calls.lock().push((sql.to_string(), params.to_vec()));
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let idents = identifiers(sql);
        let (table, columns) = idents
            .split_first()
            .ok_or_else(|| OrmError::Internal(format!("unsupported insert: {}", sql)))?;
        let key = columns.last().ok_or_else(|| OrmError::Internal("insert without columns".to_string()))?;
        let record: Record = columns.iter().cloned().zip(params.iter().cloned()).collect();

        let mut tables = self.tables.write();
        let rows = tables.entry(table.clone()).or_default();
        if rows.iter().any(|row| row.get(key) == record.get(key)) {
            return Err(OrmError::Driver(sqlx::Error::Protocol(format!(
                "Duplicate entry for key '{}'",
                key
            ))));
        }
        rows.push(record);
        Ok(1)
    }

    fn update(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let idents = identifiers(sql);
        let (table, rest) = idents
            .split_first()
            .ok_or_else(|| OrmError::Internal(format!("unsupported update: {}", sql)))?;
        let (key, assigned) = rest
            .split_last()
            .ok_or_else(|| OrmError::Internal(format!("unsupported update: {}", sql)))?;
        let key_value = params.last().cloned().unwrap_or(Value::Null);

        let mut tables = self.tables.write();
        let mut affected = 0;
        for row in tables.get_mut(table).into_iter().flatten() {
            if row.get(key) == Some(&key_value) {
                // A key-only update assigns the key to itself
                for (column, value) in assigned.iter().zip(params.iter()).filter(|(c, _)| *c != key) {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn delete(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let idents = identifiers(sql);
        let [table, key] = idents.as_slice() else {
            return Err(OrmError::Internal(format!("unsupported delete: {}", sql)));
        };
        let key_value = params.first().cloned().unwrap_or(Value::Null);

        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| row.get(key) != Some(&key_value));
        Ok((before - rows.len()) as u64)
    }

    fn select(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let (head, tail) = sql
            .split_once(" from ")
            .ok_or_else(|| OrmError::Internal(format!("unsupported select: {}", sql)))?;
        let tail_idents = identifiers(tail);
        let table = tail_idents
            .first()
            .ok_or_else(|| OrmError::Internal(format!("unsupported select: {}", sql)))?;

        let tables = self.tables.read();
        let rows = tables.get(table).cloned().unwrap_or_default();

        if head.contains(&format!("as `{}`", AGGREGATE_ALIAS)) {
            let count = Value::Int(rows.len() as i64);
            return Ok(vec![[(AGGREGATE_ALIAS, count)].into_iter().collect()]);
        }

        let columns = identifiers(head);
        let mut matched: Vec<Record> = match (tail.contains(" where "), tail_idents.get(1)) {
            (true, Some(key)) => {
                let key_value = params.first().cloned().unwrap_or(Value::Null);
                rows.into_iter().filter(|row| row.get(key) == Some(&key_value)).collect()
            }
            _ => rows,
        };

        if tail.contains(" limit ?, ?") {
            let (offset, count) = match params {
                [.., Value::Int(offset), Value::Int(count)] => (*offset as usize, *count as usize),
                _ => return Err(OrmError::Internal("bad limit params".to_string())),
            };
            matched = matched.into_iter().skip(offset).take(count).collect();
        } else if tail.contains(" limit ?") {
            let count = match params.last() {
                Some(Value::Int(count)) => *count as usize,
                _ => return Err(OrmError::Internal("bad limit params".to_string())),
            };
            matched.truncate(count);
        }

        Ok(matched
            .into_iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| (c.clone(), record.get(c).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect())
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }

    async fn fetch(&self, sql: &str, params: &[Value], limit: Option<usize>) -> Result<Vec<Row>> {
        self.fetch_limits.lock().push(limit);
        self.record(sql, params)?;
        let mut rows = self.select(sql, params)?;
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.record(sql, params)?;
        if sql.starts_with("insert into ") {
            self.insert(sql, params)
        } else if sql.starts_with("update ") {
            self.update(sql, params)
        } else if sql.starts_with("delete from ") {
            self.delete(sql, params)
        } else {
            Err(OrmError::Internal(format!("unsupported statement: {}", sql)))
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}

/// Back-tick quoted identifiers of `sql`, in order.
fn identifiers(sql: &str) -> Vec<String> {
    sql.split('`')
        .enumerate()
        .filter(|(idx, _)| idx % 2 == 1)
        .map(|(_, ident)| ident.to_string())
        .collect()
}
