//! Minimal async object-relational mapper for MySQL.
//!
//! A model declares its fields once; registration validates the declaration
//! and synthesizes the select/insert/update/delete statements. Entity
//! instances fill in parameter lists from their values and send the
//! statements through a [`Database`] gateway backed by a SQLx pool.
//!
//! # Architecture
//!
//! ```text
//! Field descriptors (field.rs)
//!           |
//!    Registrar (schema.rs) --> Statement synthesizer (statement.rs)
//!           |
//!    Entity<M> (entity.rs, query.rs)
//!           |
//!    Database gateway (gateway.rs)
//!           |
//!    Driver (driver.rs) --> SQLx MySQL pool
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use ormlet::{ConnectionConfig, Database, Entity, Field, FindOptions, Model, Schema, SchemaBuilder};
//!
//! struct UserModel;
//!
//! impl Model for UserModel {
//!     fn declare() -> SchemaBuilder {
//!         Schema::builder("User")
//!             .table("users")
//!             .field(Field::string("id").primary_key())
//!             .field(Field::string("name"))
//!             .field(Field::boolean("admin"))
//!     }
//!
//!     ormlet::model_cell!();
//! }
//!
//! type User = Entity<UserModel>;
//!
//! # async fn example() -> ormlet::Result<()> {
//! UserModel::register()?;
//! let db = Database::connect(ConnectionConfig::new("www", "www", "awesome")).await?;
//!
//! let mut user = User::from_values([("id", "u1"), ("name", "Alice")])?;
//! user.save(&db).await?;
//!
//! let admins = User::find_all(&db, FindOptions::new().where_clause("`admin`=?").args([true])).await?;
//! let total = User::find_number(&db, "count(`id`)", None, Vec::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Async Runtime
//!
//! All database operations are async and require a Tokio runtime. Each
//! operation acquires a pooled connection and returns it before the result
//! is delivered.

/// Connection pool configuration.
pub mod connection;

/// The `Driver` seam and the SQLx MySQL implementation.
pub mod driver;

/// Entity instances and CRUD.
pub mod entity;

/// Field descriptors.
pub mod field;

/// Execution gateway: statement logging, placeholder rewriting, error passthrough.
pub mod gateway;

/// `find_all` options and limit handling.
pub mod query;

/// Result rows keyed by column name.
pub mod row;

/// Model registration.
pub mod schema;

/// SQL synthesis and placeholder handling.
pub mod statement;

/// Tagged column values and MySQL conversions.
pub mod value;

pub use connection::{ConnectionConfig, RetryConfig};
pub use driver::{Driver, MySqlDriver};
pub use entity::Entity;
pub use field::{DefaultFactory, Field, FieldDefault, FieldKind};
pub use gateway::Database;
pub use query::{FindOptions, AGGREGATE_ALIAS};
pub use row::Row;
pub use schema::{Model, Schema, SchemaBuilder};
pub use statement::{PlaceholderStyle, Statements};
pub use value::Value;

pub use ormlet_common::{OrmError, Result};

// Named by `model_cell!` expansions in downstream crates
pub use once_cell::sync::OnceCell;
