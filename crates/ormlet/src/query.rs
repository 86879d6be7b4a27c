//! Options for `Entity::find_all` and the clause splicing behind it.

use crate::{OrmError, Result, Value};

/// Column alias used by `Entity::find_number` for the aggregate result.
pub const AGGREGATE_ALIAS: &str = "_num_";

/// Raw clauses appended to a model's select statement.
///
/// `where_clause` and `order_by` are spliced in verbatim; values belong in
/// `args` behind `?` placeholders.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub where_clause: Option<String>,
    pub args: Vec<Value>,
    pub order_by: Option<String>,
    pub limit: Option<Value>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    pub fn args<I, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    /// `limit ?` with a row count.
    pub fn limit(self, count: i64) -> Self {
        self.limit_value(Value::Int(count))
    }

    /// `limit ?, ?` with an offset and a row count.
    pub fn limit_range(self, offset: i64, count: i64) -> Self {
        self.limit_value(Value::from((offset, count)))
    }

    /// Raw limit value. Checked when the statement is built: an integer or a
    /// pair of integers is accepted, anything else is rejected.
    pub fn limit_value(mut self, limit: impl Into<Value>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Appends the clauses to `base`, returning the statement and its
    /// parameters (`args` followed by the limit values).
    ///
    /// # Errors
    ///
    /// `OrmError::InvalidArgument` for a limit that is neither an integer nor
    /// a pair of integers.
    pub fn build_select(&self, base: &str) -> Result<(String, Vec<Value>)> {
        let mut sql = String::from(base);
        let mut params = self.args.clone();

        if let Some(clause) = &self.where_clause {
            sql.push_str(" where ");
            sql.push_str(clause);
        }
        if let Some(clause) = &self.order_by {
            sql.push_str(" order by ");
            sql.push_str(clause);
        }
        if let Some(limit) = &self.limit {
            match LimitClause::from_value(limit)? {
                LimitClause::Count(count) => {
                    sql.push_str(" limit ?");
                    params.push(Value::Int(count));
                }
                LimitClause::Range { offset, count } => {
                    sql.push_str(" limit ?, ?");
                    params.push(Value::Int(offset));
                    params.push(Value::Int(count));
                }
            }
        }

        Ok((sql, params))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LimitClause {
    Count(i64),
    Range { offset: i64, count: i64 },
}

impl LimitClause {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(count) => Ok(LimitClause::Count(*count)),
            Value::Array(items) => match items.as_slice() {
                [Value::Int(offset), Value::Int(count)] => Ok(LimitClause::Range {
                    offset: *offset,
                    count: *count,
                }),
                _ => Err(invalid_limit(value)),
            },
            _ => Err(invalid_limit(value)),
        }
    }
}

fn invalid_limit(value: &Value) -> OrmError {
    OrmError::InvalidArgument(format!("Invalid limit value: {}", value))
}
