// Call-time error types
use thiserror::Error;

/// Errors attached to a statement while it runs through its callback chain
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DbError {
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("callback {callback} failed: {message}")]
    Handler { callback: String, message: String },

    #[error("no connection pool configured")]
    ConnectionNotConfigured,

    #[error("Query error: {0}")]
    Query(String),

    #[error("record not found")]
    RecordNotFound,

    #[error("WHERE conditions required")]
    MissingWhereClause,
}

impl DbError {
    pub fn handler(callback: impl Into<String>, message: impl Into<String>) -> Self {
        DbError::Handler {
            callback: callback.into(),
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        DbError::Query(message.into())
    }

    /// Parse failures of this class are tolerated once a table name is known
    pub fn is_unsupported_data_type(&self) -> bool {
        matches!(self, DbError::UnsupportedDataType(_))
    }
}
