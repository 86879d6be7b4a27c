//! Model registration.
//!
//! A model declares its fields once through [`SchemaBuilder`]; building the
//! schema validates the declaration and synthesizes the statements. The
//! resulting [`Schema`] is immutable and lives for the rest of the process.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::field::Field;
use crate::statement::{validate_identifier, Statements};
use crate::{OrmError, Result};

/// Derived metadata for one model.
#[derive(Debug)]
pub struct Schema {
    model_name: String,
    table: String,
    fields: HashMap<String, Field>,
    primary_key: String,
    non_key_fields: Vec<String>,
    statements: Statements,
}

impl Schema {
    /// Starts declaring a model. The table name defaults to the model name.
    pub fn builder(model_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            model_name: model_name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Non-key field names in declaration order. This order is the parameter
    /// order of the insert and update statements.
    pub fn non_key_fields(&self) -> &[String] {
        &self.non_key_fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Looks up a field, failing for names the model does not declare.
    pub fn require_field(&self, name: &str) -> Result<&Field> {
        self.fields.get(name).ok_or_else(|| {
            OrmError::InvalidArgument(format!("'{}' object has no field '{}'", self.model_name, name))
        })
    }

    pub fn statements(&self) -> &Statements {
        &self.statements
    }
}

/// Collects field descriptors for a model.
#[derive(Debug)]
pub struct SchemaBuilder {
    model_name: String,
    table: Option<String>,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Overrides the table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declares the next field. Declaration order fixes statement parameter order.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates the declaration and synthesizes the statements.
    ///
    /// # Errors
    ///
    /// `OrmError::Schema` when no field or more than one field is the primary
    /// key, when a field name repeats, or when a name is not a valid identifier.
    pub fn build(self) -> Result<Schema> {
        let table = self.table.unwrap_or_else(|| self.model_name.clone());
        validate_identifier(&table)?;

        let mut fields = HashMap::with_capacity(self.fields.len());
        let mut non_key_fields = Vec::new();
        let mut primary_key: Option<String> = None;

        for field in self.fields {
            validate_identifier(field.name())?;
            if fields.contains_key(field.name()) {
                return Err(OrmError::Schema(format!("Duplicate field: {}", field.name())));
            }
            debug!("  found mapping: {} ==> {}", field.name(), field);

            if field.is_primary_key() {
                if primary_key.is_some() {
                    return Err(OrmError::Schema(format!(
                        "Duplicate primary key for field: {}",
                        field.name()
                    )));
                }
                primary_key = Some(field.name().to_string());
            } else {
                non_key_fields.push(field.name().to_string());
            }
            fields.insert(field.name().to_string(), field);
        }

        let primary_key = primary_key
            .ok_or_else(|| OrmError::Schema(format!("Primary key not found for model {}", self.model_name)))?;

        let statements = Statements::synthesize(&table, &primary_key, &non_key_fields);

        Ok(Schema {
            model_name: self.model_name,
            table,
            fields,
            primary_key,
            non_key_fields,
            statements,
        })
    }
}

/// A type mapped to a table.
///
/// Implementors declare their fields and supply the cell their schema is kept
/// in; [`model_cell!`](crate::model_cell) writes the latter.
///
/// ```ignore
/// struct UserModel;
///
/// impl Model for UserModel {
///     fn declare() -> SchemaBuilder {
///         Schema::builder("User")
///             .table("users")
///             .field(Field::integer("id").primary_key())
///             .field(Field::string("name"))
///     }
///
///     ormlet::model_cell!();
/// }
///
/// type User = Entity<UserModel>;
/// ```
pub trait Model: Send + Sync + 'static {
    /// Declares the model's fields.
    fn declare() -> SchemaBuilder;

    /// Per-model storage for the registered schema.
    fn schema_cell() -> &'static OnceCell<Schema>;

    /// Registers the model, returning its schema.
    ///
    /// The declaration is built on the first successful call only. Call this
    /// at startup so malformed declarations fail before any query runs.
    fn register() -> Result<&'static Schema> {
        Self::schema_cell().get_or_try_init(|| {
            let schema = Self::declare().build()?;
            info!("found model: {} (table: {})", schema.model_name(), schema.table());
            Ok(schema)
        })
    }
}

/// Implements [`Model::schema_cell`] with a static cell private to the impl.
#[macro_export]
macro_rules! model_cell {
    () => {
        fn schema_cell() -> &'static $crate::OnceCell<$crate::Schema> {
            static CELL: $crate::OnceCell<$crate::Schema> = $crate::OnceCell::new();
            &CELL
        }
    };
}
