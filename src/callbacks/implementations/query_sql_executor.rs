// Query SQL executor - builds and runs SELECT statements
use crate::callbacks::context::Statement;
use crate::callbacks::traits::CallbackHandler;
use crate::error::DbError;

use super::clauses;

/// Selects rows by equality conditions, scoping out soft-deleted rows
#[derive(Debug, Default, Clone, Copy)]
pub struct QuerySqlExecutor;

impl CallbackHandler for QuerySqlExecutor {
    fn call(&self, stmt: &mut Statement) -> Result<(), DbError> {
        if stmt.has_errors() {
            return Ok(());
        }

        if stmt.sql.is_empty() {
            let table = clauses::table(stmt)?;
            let mut parts = clauses::conditions(stmt)?;
            parts.extend(clauses::soft_delete_scope(stmt));
            stmt.sql = format!("SELECT * FROM {}{}", table, clauses::where_sql(&parts));
        }

        clauses::query(stmt)
    }
}
