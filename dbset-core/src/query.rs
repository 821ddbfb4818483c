use crate::{Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// SQL text ready to be executed by an [`crate::Executor`].
///
/// May hold several statements separated by `;`, drivers run them in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query {
    sql: String,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
    pub fn as_str(&self) -> &str {
        &self.sql
    }
    pub fn into_sql(self) -> String {
        self.sql
    }
    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Query::new(value)
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Query::new(value)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted identifier when available.
    pub last_affected_id: Option<i64>,
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;

/// A raw result row with its column labels, values are the engine storage values.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Box<[Value]>,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Box<[Value]>) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
}

/// Items emitted by `Executor::run`, rows and modify results interleaved.
#[derive(Debug)]
pub enum QueryResult {
    Row(RowLabeled),
    Affected(RowsAffected),
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}
