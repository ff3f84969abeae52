// Delete SQL executor - soft or hard deletes depending on the model
use serde_json::Value;

use crate::callbacks::context::Statement;
use crate::callbacks::traits::CallbackHandler;
use crate::database::schema::DELETED_AT;
use crate::error::DbError;

use super::clauses;

/// Stamps `deleted_at` on soft-delete models, issues DELETE otherwise
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteSqlExecutor;

impl CallbackHandler for DeleteSqlExecutor {
    fn call(&self, stmt: &mut Statement) -> Result<(), DbError> {
        if stmt.has_errors() {
            return Ok(());
        }

        if stmt.sql.is_empty() {
            self.build(stmt)?;
        }

        clauses::exec(stmt)
    }
}

impl DeleteSqlExecutor {
    fn build(&self, stmt: &mut Statement) -> Result<(), DbError> {
        let table = clauses::table(stmt)?;

        match clauses::soft_delete_scope(stmt) {
            Some(scope) => {
                let column = stmt.quote(DELETED_AT);
                let now = Value::String(chrono::Utc::now().to_rfc3339());
                let placeholder = stmt.add_var(now);
                let mut parts = clauses::conditions(stmt)?;
                if parts.is_empty() && !stmt.config.allow_global_update {
                    return Err(DbError::MissingWhereClause);
                }
                parts.push(scope);
                stmt.sql = format!(
                    "UPDATE {} SET {} = {}{}",
                    table,
                    column,
                    placeholder,
                    clauses::where_sql(&parts)
                );
            }
            None => {
                let parts = clauses::conditions(stmt)?;
                if parts.is_empty() && !stmt.config.allow_global_update {
                    return Err(DbError::MissingWhereClause);
                }
                stmt.sql = format!("DELETE FROM {}{}", table, clauses::where_sql(&parts));
            }
        }
        Ok(())
    }
}
