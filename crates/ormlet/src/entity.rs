//! Entity instances and their CRUD surface.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde_json::Value as JsonValue;
use tracing::{debug, instrument, warn};

use crate::gateway::Database;
use crate::query::{FindOptions, AGGREGATE_ALIAS};
use crate::row::Row;
use crate::schema::{Model, Schema};
use crate::statement::quote_identifier;
use crate::{OrmError, Result, Value};

/// One record of model `M`: field name → value.
///
/// Only fields the model declares can be read or written. Fields that were
/// never set are simply absent until a default is resolved for them.
pub struct Entity<M: Model> {
    schema: &'static Schema,
    values: HashMap<String, Value>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Entity<M> {
    /// Creates an empty instance, registering `M` if needed.
    ///
    /// # Errors
    ///
    /// `OrmError::Schema` if the model declaration is malformed.
    pub fn new() -> Result<Self> {
        Ok(Self {
            schema: M::register()?,
            values: HashMap::new(),
            _model: PhantomData,
        })
    }

    /// Creates an instance from name/value pairs.
    pub fn from_values<I, K, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut entity = Self::new()?;
        for (name, value) in values {
            entity.set(name, value)?;
        }
        Ok(entity)
    }

    /// Creates an instance from a result row.
    pub fn from_row(row: Row) -> Result<Self> {
        Self::from_values(row.into_columns())
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Current value of `name`, or `None` if it was never set.
    pub fn get_value(&self, name: &str) -> Result<Option<&Value>> {
        self.schema.require_field(name)?;
        Ok(self.values.get(name))
    }

    /// Current value of `name`; when unset (or NULL) the field's default is
    /// resolved, stored on the instance and returned. A field without a
    /// default yields `Value::Null`.
    pub fn get_value_or_default(&mut self, name: &str) -> Result<Value> {
        let field = self.schema.require_field(name)?;

        if let Some(value) = self.values.get(name).filter(|v| !v.is_null()) {
            return Ok(value.clone());
        }

        match field.default() {
            Some(default) => {
                let value = default.resolve();
                debug!("using default value for {}: {}", name, value);
                self.values.insert(name.to_string(), value.clone());
                Ok(value)
            }
            None => Ok(Value::Null),
        }
    }

    /// Sets a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let name = name.into();
        self.schema.require_field(&name)?;
        self.values.insert(name, value.into());
        Ok(())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Values currently set on the instance.
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    pub fn primary_key_value(&self) -> Option<&Value> {
        self.values.get(self.schema.primary_key())
    }

    /// Renders the set fields as a JSON object.
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        JsonValue::Object(map)
    }

    /// Inserts the instance, resolving defaults for unset fields first.
    ///
    /// Returns the affected-row count; anything other than 1 is logged as a
    /// warning, not raised.
    #[instrument(skip(self, db), fields(model = %self.schema.model_name()))]
    pub async fn save(&mut self, db: &Database) -> Result<u64> {
        let schema = self.schema;
        let mut params = Vec::with_capacity(schema.non_key_fields().len() + 1);
        for name in schema.non_key_fields() {
            params.push(self.get_value_or_default(name)?);
        }
        params.push(self.get_value_or_default(schema.primary_key())?);

        let affected = db.execute(&schema.statements().insert, &params).await?;
        if affected != 1 {
            warn!("failed to insert record: affected rows: {}", affected);
        }
        Ok(affected)
    }

    /// Updates the stored row by primary key. Defaults are not resolved;
    /// unset fields are written as NULL.
    #[instrument(skip(self, db), fields(model = %self.schema.model_name()))]
    pub async fn update(&self, db: &Database) -> Result<u64> {
        let schema = self.schema;
        let params: Vec<Value> = schema
            .non_key_fields()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(schema.primary_key()))
            .map(|name| self.values.get(name).cloned().unwrap_or(Value::Null))
            .collect();

        let affected = db.execute(&schema.statements().update, &params).await?;
        if affected != 1 {
            warn!("failed to update by primary key: affected rows: {}", affected);
        }
        Ok(affected)
    }

    /// Deletes the stored row by primary key.
    #[instrument(skip(self, db), fields(model = %self.schema.model_name()))]
    pub async fn remove(&self, db: &Database) -> Result<u64> {
        let pk = self.primary_key_value().cloned().unwrap_or(Value::Null);

        let affected = db.execute(&self.schema.statements().delete, &[pk]).await?;
        if affected != 1 {
            warn!("failed to remove by primary key: affected rows: {}", affected);
        }
        Ok(affected)
    }

    /// Looks up one instance by primary key.
    #[instrument(skip_all)]
    pub async fn find(db: &Database, pk: impl Into<Value>) -> Result<Option<Self>> {
        let schema = M::register()?;
        let sql = format!(
            "{} where {}=?",
            schema.statements().select,
            quote_identifier(schema.primary_key())
        );

        let rows = db.select(&sql, &[pk.into()], Some(1)).await?;
        rows.into_iter().next().map(Self::from_row).transpose()
    }

    /// Selects every instance matching `options`, in row order.
    ///
    /// # Errors
    ///
    /// `OrmError::InvalidArgument` for a malformed limit; driver errors as
    /// returned by the gateway.
    #[instrument(skip_all)]
    pub async fn find_all(db: &Database, options: FindOptions) -> Result<Vec<Self>> {
        let schema = M::register()?;
        let (sql, params) = options.build_select(&schema.statements().select)?;

        let rows = db.select(&sql, &params, None).await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    /// Evaluates an aggregate expression such as `count(id)` over the table.
    ///
    /// Returns `None` when no row comes back.
    #[instrument(skip(db, args))]
    pub async fn find_number(
        db: &Database,
        select_expr: &str,
        where_clause: Option<&str>,
        args: Vec<Value>,
    ) -> Result<Option<Value>> {
        let schema = M::register()?;
        let mut sql = format!(
            "select {} as {} from {}",
            select_expr,
            quote_identifier(AGGREGATE_ALIAS),
            quote_identifier(schema.table())
        );
        if let Some(clause) = where_clause {
            sql.push_str(" where ");
            sql.push_str(clause);
        }

        let rows = db.select(&sql, &args, Some(1)).await?;
        match rows.into_iter().next() {
            None => Ok(None),
            Some(row) => row.get(AGGREGATE_ALIAS).cloned().map(Some).ok_or_else(|| {
                OrmError::InvalidArgument(format!(
                    "malformed aggregate lookup: column '{}' missing from result",
                    AGGREGATE_ALIAS
                ))
            }),
        }
    }
}

impl<M: Model> Clone for Entity<M> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema,
            values: self.values.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> fmt::Debug for Entity<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("model", &self.schema.model_name())
            .field("values", &self.values)
            .finish()
    }
}

impl<M: Model> fmt::Display for Entity<M> {
    /// `User(id=1, name="a")`, declared fields only, key first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.model_name())?;
        let names = std::iter::once(self.schema.primary_key())
            .chain(self.schema.non_key_fields().iter().map(String::as_str));
        let mut first = true;
        for name in names {
            if let Some(value) = self.values.get(name) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", name, value)?;
                first = false;
            }
        }
        write!(f, ")")
    }
}
