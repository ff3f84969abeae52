// Row and raw SQL executors - run caller-supplied SQL as-is
use crate::callbacks::context::Statement;
use crate::callbacks::traits::CallbackHandler;
use crate::error::DbError;

use super::clauses;

fn require_sql(stmt: &Statement) -> Result<(), DbError> {
    if stmt.sql.trim().is_empty() {
        return Err(DbError::query(format!("{} statement has no SQL", stmt.operation)));
    }
    Ok(())
}

/// Runs the statement's SQL as a query, rows land in `dest`
#[derive(Debug, Default, Clone, Copy)]
pub struct RowSqlExecutor;

impl CallbackHandler for RowSqlExecutor {
    fn call(&self, stmt: &mut Statement) -> Result<(), DbError> {
        if stmt.has_errors() {
            return Ok(());
        }
        require_sql(stmt)?;
        clauses::query(stmt)
    }
}

/// Runs the statement's SQL for its side effects
#[derive(Debug, Default, Clone, Copy)]
pub struct RawSqlExecutor;

impl CallbackHandler for RawSqlExecutor {
    fn call(&self, stmt: &mut Statement) -> Result<(), DbError> {
        if stmt.has_errors() {
            return Ok(());
        }
        require_sql(stmt)?;
        clauses::exec(stmt)
    }
}
