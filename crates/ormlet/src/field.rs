//! Field descriptors.
//!
//! A `Field` describes one persisted column: its name, the SQL column type
//! (an opaque string, never interpreted here), whether it is the primary key,
//! and the default used when an instance is saved without a value for it.

use std::fmt;
use std::sync::Arc;

use crate::Value;

/// Produces a fresh default value each time it is called.
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default for a field: either a fixed value or a factory.
#[derive(Clone)]
pub enum FieldDefault {
    Value(Value),
    Factory(DefaultFactory),
}

impl FieldDefault {
    /// Resolves the default, invoking the factory if there is one.
    pub fn resolve(&self) -> Value {
        match self {
            FieldDefault::Value(v) => v.clone(),
            FieldDefault::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Which convenience constructor produced a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
    Custom,
}

impl FieldKind {
    /// Name used in diagnostics (`<IntegerField, bigint:id>`).
    pub fn class_name(&self) -> &'static str {
        match self {
            FieldKind::String => "StringField",
            FieldKind::Boolean => "BooleanField",
            FieldKind::Integer => "IntegerField",
            FieldKind::Float => "FloatField",
            FieldKind::Text => "TextField",
            FieldKind::Custom => "Field",
        }
    }
}

/// Describes one mapped column.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    column_type: String,
    primary_key: bool,
    default: Option<FieldDefault>,
    kind: FieldKind,
}

impl Field {
    /// Creates a descriptor with an arbitrary column type.
    pub fn new(
        name: impl Into<String>,
        column_type: impl Into<String>,
        primary_key: bool,
        default: Option<FieldDefault>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            primary_key,
            default,
            kind: FieldKind::Custom,
        }
    }

    fn of_kind(name: impl Into<String>, kind: FieldKind, column_type: &str, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.to_string(),
            primary_key: false,
            default: default.map(FieldDefault::Value),
            kind,
        }
    }

    /// `varchar(100)`, no default.
    pub fn string(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::String, "varchar(100)", None)
    }

    /// `boolean`, defaults to `false`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Boolean, "boolean", Some(Value::Bool(false)))
    }

    /// `bigint`, defaults to `0`.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Integer, "bigint", Some(Value::Int(0)))
    }

    /// `real`, defaults to `0.0`.
    pub fn float(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Float, "real", Some(Value::Float(0.0)))
    }

    /// `text`, no default.
    pub fn text(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Text, "text", None)
    }

    /// Marks this field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Overrides the column type (e.g. `varchar(50)`).
    pub fn ddl(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = column_type.into();
        self
    }

    /// Replaces the default with a fixed value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Replaces the default with a factory invoked at save time.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Factory(Arc::new(factory)));
        self
    }

    /// Removes the default.
    pub fn no_default(mut self) -> Self {
        self.default = None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}:{}>", self.kind.class_name(), self.column_type, self.name)
    }
}
