use serde_json::{Map, Value};

use crate::error::DbError;

/// Connection collaborator that performs the actual I/O for built statements
pub trait ConnPool: Send + Sync {
    /// Run a statement and return the number of rows affected
    fn exec(&self, sql: &str, vars: &[Value]) -> Result<i64, DbError>;

    /// Run a query and return its rows as column maps
    fn query(&self, sql: &str, vars: &[Value]) -> Result<Vec<Map<String, Value>>, DbError>;
}
