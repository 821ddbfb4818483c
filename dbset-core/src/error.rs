use crate::{ColumnType, Error};

/// Every failure raised by dbset itself.
///
/// Functions return [`crate::Result`], the variant is recovered with
/// `error.downcast_ref::<DbError>()`.
#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Table `{table}` does not exist")]
    TableNotFound { table: String },
    #[error("Column `{column}` does not exist in table `{table}`")]
    ColumnNotFound { table: String, column: String },
    #[error("Read-only mode: {0}")]
    ReadOnly(String),
    #[error("Transaction error: {0}")]
    Transaction(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Schema error on table `{table}`{}: {message}", describe_column(.column, .column_type))]
    Schema {
        table: String,
        column: Option<String>,
        column_type: Option<ColumnType>,
        message: String,
    },
    #[error("Query error: {0}")]
    Query(String),
    #[error("Type inference error: {0}")]
    TypeInference(String),
}

fn describe_column(column: &Option<String>, column_type: &Option<ColumnType>) -> String {
    match (column, column_type) {
        (Some(column), Some(column_type)) => format!(" (column `{}` {})", column, column_type),
        (Some(column), None) => format!(" (column `{}`)", column),
        _ => String::new(),
    }
}

/// Discriminant of [`DbError`], handy in assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    TableNotFound,
    ColumnNotFound,
    ReadOnly,
    Transaction,
    Validation,
    Schema,
    Query,
    TypeInference,
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Connection(..) => ErrorKind::Connection,
            DbError::TableNotFound { .. } => ErrorKind::TableNotFound,
            DbError::ColumnNotFound { .. } => ErrorKind::ColumnNotFound,
            DbError::ReadOnly(..) => ErrorKind::ReadOnly,
            DbError::Transaction(..) => ErrorKind::Transaction,
            DbError::Validation(..) => ErrorKind::Validation,
            DbError::Schema { .. } => ErrorKind::Schema,
            DbError::Query(..) => ErrorKind::Query,
            DbError::TypeInference(..) => ErrorKind::TypeInference,
        }
    }

    /// Kind of the first [`DbError`] found in the chain of `error`.
    pub fn kind_of(error: &Error) -> Option<ErrorKind> {
        error
            .downcast_ref::<DbError>()
            .or_else(|| error.chain().find_map(|e| e.downcast_ref::<DbError>()))
            .map(DbError::kind)
    }

    pub(crate) fn schema(table: &str, message: impl Into<String>) -> Self {
        DbError::Schema {
            table: table.into(),
            column: None,
            column_type: None,
            message: message.into(),
        }
    }

    pub(crate) fn schema_column(
        table: &str,
        column: &str,
        column_type: &ColumnType,
        message: impl Into<String>,
    ) -> Self {
        DbError::Schema {
            table: table.into(),
            column: Some(column.into()),
            column_type: Some(column_type.clone()),
            message: message.into(),
        }
    }
}
