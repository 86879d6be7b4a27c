//! Type mapping between Rust values and MySQL column values.
//!
//! `Value` is the tagged value every mapped field holds. The conversion to
//! driver arguments and back from result rows happens here so the rest of the
//! crate never touches driver types.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::{Arguments, Column, Row as SqlxRow, TypeInfo, ValueRef};
use tracing::warn;

use crate::{OrmError, Result};

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean (BOOLEAN / TINYINT(1))
    Bool(bool),
    /// Any signed or unsigned integer that fits in 64 bits (TINYINT..BIGINT)
    Int(i64),
    /// Floating point (FLOAT, DOUBLE, REAL)
    Float(f64),
    /// Fixed point (DECIMAL, NUMERIC); also what MySQL returns for SUM/AVG
    Decimal(Decimal),
    /// Character data (CHAR, VARCHAR, TEXT, ENUM)
    String(String),
    /// Binary data (BINARY, VARBINARY, BLOB)
    Bytes(Vec<u8>),
    /// Date (DATE)
    Date(NaiveDate),
    /// Time of day (TIME)
    Time(NaiveTime),
    /// Timestamp without timezone (DATETIME, TIMESTAMP)
    Timestamp(NaiveDateTime),
    /// JSON document (JSON)
    Json(JsonValue),
    /// List of values. MySQL has no array type, so arrays are bound as JSON.
    Array(Vec<Value>),
}

impl Value {
    /// Returns the SQL type name for this value, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "BIGINT",
            Value::Float(_) => "DOUBLE",
            Value::Decimal(_) => "DECIMAL",
            Value::String(_) => "VARCHAR",
            Value::Bytes(_) => "BLOB",
            Value::Date(_) => "DATE",
            Value::Time(_) => "TIME",
            Value::Timestamp(_) => "DATETIME",
            Value::Json(_) => "JSON",
            Value::Array(_) => "ARRAY",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Decimal(d) => d.to_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as JSON.
    ///
    /// Decimals and temporal values become strings; bytes become an array of
    /// numbers; non-finite floats become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Decimal(d) => JsonValue::String(d.to_string()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Bytes(b) => JsonValue::Array(b.iter().map(|byte| JsonValue::from(*byte)).collect()),
            Value::Date(d) => JsonValue::String(d.to_string()),
            Value::Time(t) => JsonValue::String(t.to_string()),
            Value::Timestamp(ts) => JsonValue::String(ts.to_string()),
            Value::Json(j) => j.clone(),
            Value::Array(values) => JsonValue::Array(values.iter().map(Value::to_json).collect()),
        }
    }

    /// Bind this value as the next positional argument of a MySQL statement.
    pub fn bind_to_arguments(&self, arguments: &mut MySqlArguments) -> Result<()> {
        let bound = match self {
            // A typed NULL; MySQL accepts it for any column type
            Value::Null => arguments.add(Option::<String>::None),
            Value::Bool(v) => arguments.add(*v),
            Value::Int(v) => arguments.add(*v),
            Value::Float(v) => arguments.add(*v),
            Value::Decimal(v) => arguments.add(*v),
            Value::String(v) => arguments.add(v.clone()),
            Value::Bytes(v) => arguments.add(v.clone()),
            Value::Date(v) => arguments.add(*v),
            Value::Time(v) => arguments.add(*v),
            Value::Timestamp(v) => arguments.add(*v),
            Value::Json(v) => arguments.add(sqlx::types::Json(v.clone())),
            Value::Array(_) => arguments.add(sqlx::types::Json(self.to_json())),
        };

        bound.map_err(|e| OrmError::InvalidArgument(format!("Failed to bind {}: {}", self.type_name(), e)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Json(j) => write!(f, "{}", j),
            Value::Array(values) => {
                write!(f, "(")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.naive_utc())
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Value::Json(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

/// `(offset, count)` pairs, the shape `find_all` accepts as a ranged limit.
impl From<(i64, i64)> for Value {
    fn from((a, b): (i64, i64)) -> Self {
        Value::Array(vec![Value::Int(a), Value::Int(b)])
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Decodes every column of a MySQL result row into a name → value map.
pub fn row_to_values(row: &MySqlRow) -> Result<HashMap<String, Value>> {
    let mut columns = HashMap::with_capacity(row.columns().len());

    for (idx, column) in row.columns().iter().enumerate() {
        let column_name = column.name().to_string();

        let raw = row
            .try_get_raw(idx)
            .map_err(|e| OrmError::Decode(format!("Failed to read column '{}': {}", column_name, e)))?;
        if raw.is_null() {
            columns.insert(column_name, Value::Null);
            continue;
        }

        let value = match column.type_info().name() {
            "BOOLEAN" => Value::Bool(decode::<bool>(row, idx, &column_name)?),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                Value::Int(decode::<i64>(row, idx, &column_name)?)
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => {
                let v = decode::<u64>(row, idx, &column_name)?;
                let v = i64::try_from(v).map_err(|_| {
                    OrmError::Decode(format!("Value {} in column '{}' overflows BIGINT", v, column_name))
                })?;
                Value::Int(v)
            }
            "FLOAT" => Value::Float(f64::from(decode::<f32>(row, idx, &column_name)?)),
            "DOUBLE" => Value::Float(decode::<f64>(row, idx, &column_name)?),
            "DECIMAL" => Value::Decimal(decode::<Decimal>(row, idx, &column_name)?),
            "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
                Value::String(decode::<String>(row, idx, &column_name)?)
            }
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                Value::Bytes(decode::<Vec<u8>>(row, idx, &column_name)?)
            }
            "DATE" => Value::Date(decode::<NaiveDate>(row, idx, &column_name)?),
            "TIME" => Value::Time(decode::<NaiveTime>(row, idx, &column_name)?),
            "DATETIME" | "TIMESTAMP" => Value::Timestamp(decode::<NaiveDateTime>(row, idx, &column_name)?),
            "JSON" => Value::Json(decode::<JsonValue>(row, idx, &column_name)?),
            unknown => {
                warn!("Unknown MySQL type '{}' for column '{}', attempting string extraction", unknown, column_name);
                match row.try_get::<String, _>(idx) {
                    Ok(v) => Value::String(v),
                    Err(_) => Value::Bytes(decode::<Vec<u8>>(row, idx, &column_name)?),
                }
            }
        };

        columns.insert(column_name, value);
    }

    Ok(columns)
}

fn decode<'r, T>(row: &'r MySqlRow, idx: usize, column_name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
{
    row.try_get::<T, _>(idx).map_err(|e| {
        OrmError::Decode(format!(
            "Failed to extract {} from column '{}': {}",
            std::any::type_name::<T>(),
            column_name,
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_names() {
        assert_eq!(Value::Null.type_name(), "NULL");
        assert_eq!(Value::Bool(true).type_name(), "BOOLEAN");
        assert_eq!(Value::Int(1).type_name(), "BIGINT");
        assert_eq!(Value::Float(1.0).type_name(), "DOUBLE");
        assert_eq!(Value::String("a".into()).type_name(), "VARCHAR");
        assert_eq!(Value::Array(vec![]).type_name(), "ARRAY");
    }

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::from(5u8), Value::Int(5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(1.5f64), Value::Float(1.5));
        assert_eq!(Value::from("abc"), Value::String("abc".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".to_string()));
        assert_eq!(
            Value::from((10, 5)),
            Value::Array(vec![Value::Int(10), Value::Int(5)])
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
        assert_eq!(Value::Decimal(Decimal::new(250, 2)).as_f64(), Some(2.5));
        assert_eq!(Value::String("s".into()).as_str(), Some("s"));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert!(Value::Null.is_null());
        assert_eq!(Value::String("s".into()).as_i64(), None);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Null.to_json(), JsonValue::Null);
        assert_eq!(Value::Int(3).to_json(), serde_json::json!(3));
        assert_eq!(Value::Float(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(Value::Decimal(Decimal::new(1234, 2)).to_json(), serde_json::json!("12.34"));
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::String("a".into())]).to_json(),
            serde_json::json!([1, "a"])
        );
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_json(), serde_json::json!("2024-02-29"));
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let value = Value::Array(vec![Value::Bool(true), Value::Null]);
        let rendered = serde_json::to_string(&value).unwrap();
        assert_eq!(rendered, "[true,null]");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::String("x".into()).to_string(), "\"x\"");
        assert_eq!(Value::Int(4).to_string(), "4");
        assert_eq!(Value::from((10, 5)).to_string(), "(10, 5)");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_bind_to_arguments() {
        let mut args = MySqlArguments::default();
        let values = vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(42),
            Value::Float(1.25),
            Value::Decimal(Decimal::new(5, 1)),
            Value::String("hello".into()),
            Value::Bytes(vec![1, 2, 3]),
            Value::Json(serde_json::json!({"a": 1})),
            Value::Array(vec![Value::Int(1), Value::Int(2)]),
        ];
        for value in &values {
            assert!(value.bind_to_arguments(&mut args).is_ok(), "failed to bind {:?}", value);
        }
    }
}
