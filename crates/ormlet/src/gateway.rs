//! Execution gateway.
//!
//! `Database` owns the driver (and through it the pool) and is the only path
//! by which statements reach the database. It logs every statement, rewrites
//! the generic `?` placeholders for the driver, and hands driver errors back
//! to the caller untouched.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::connection::ConnectionConfig;
use crate::driver::{Driver, MySqlDriver};
use crate::row::Row;
use crate::statement::count_placeholders;
use crate::{OrmError, Result, Value};

/// Handle to a pooled database. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Database {
    driver: Arc<dyn Driver>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("driver", &self.driver).finish()
    }
}

impl Database {
    /// Creates the MySQL connection pool.
    ///
    /// # Errors
    ///
    /// `OrmError::Configuration` when `user`, `password` or `database` is
    /// missing; the driver error when the pool cannot be established.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        info!("create database connection pool...");
        let driver = MySqlDriver::connect(&config).await?;
        Ok(Self::with_driver(Arc::new(driver)))
    }

    /// Wraps an existing driver.
    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Runs a query and returns up to `row_limit` rows (all when `None`).
    #[instrument(skip(self, sql, params), fields(param_count = params.len()))]
    pub async fn select(&self, sql: &str, params: &[Value], row_limit: Option<usize>) -> Result<Vec<Row>> {
        info!("SQL: {}", sql);
        let native = self.prepare(sql, params)?;

        match self.driver.fetch(&native, params, row_limit).await {
            Ok(rows) => {
                info!("rows returned: {}", rows.len());
                Ok(rows)
            }
            Err(e) => {
                error!(sql = %sql, error = %e, "Query failed");
                Err(e)
            }
        }
    }

    /// Runs an insert, update or delete and returns the affected-row count.
    #[instrument(skip(self, sql, params), fields(param_count = params.len()))]
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        info!("SQL: {}", sql);
        let native = self.prepare(sql, params)?;

        match self.driver.execute(&native, params).await {
            Ok(affected) => {
                info!("rows affected: {}", affected);
                Ok(affected)
            }
            Err(e) => {
                error!(sql = %sql, error = %e, "Statement failed");
                Err(e)
            }
        }
    }

    /// Pings the database to verify connectivity.
    pub async fn ping(&self) -> Result<()> {
        self.driver.ping().await
    }

    /// Closes the pool.
    pub async fn close(&self) {
        info!("closing database connection pool");
        self.driver.close().await;
    }

    fn prepare<'a>(&self, sql: &'a str, params: &[Value]) -> Result<Cow<'a, str>> {
        let expected = count_placeholders(sql);
        if expected != params.len() {
            return Err(OrmError::InvalidArgument(format!(
                "Statement expects {} parameter(s) but {} were supplied",
                expected,
                params.len()
            )));
        }
        Ok(self.driver.placeholder_style().rewrite(sql))
    }
}
