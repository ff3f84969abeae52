// Update SQL executor - builds and runs UPDATE statements
use crate::callbacks::context::Statement;
use crate::callbacks::traits::CallbackHandler;
use crate::database::schema::{validate_column, PRIMARY_KEY};
use crate::error::DbError;

use super::clauses;

/// Writes the destination object's columns to every matching row
#[derive(Debug, Default, Clone, Copy)]
pub struct UpdateSqlExecutor;

impl CallbackHandler for UpdateSqlExecutor {
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

impl UpdateSqlExecutor {
    fn build(&self, stmt: &mut Statement) -> Result<(), DbError> {
        let table = clauses::table(stmt)?;

        let changes: Vec<(String, serde_json::Value)> = stmt
            .dest_rows()
            .first()
            .map(|row| {
                row.iter()
                    .filter(|(column, _)| column.as_str() != PRIMARY_KEY)
                    .map(|(column, value)| (column.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if changes.is_empty() {
            return Err(DbError::Schema(format!("no values to update in {}", stmt.table)));
        }

        let mut sets = Vec::with_capacity(changes.len());
        for (column, value) in changes {
            validate_column(&column)?;
            let quoted = stmt.quote(&column);
            let placeholder = stmt.add_var(value);
            sets.push(format!("{} = {}", quoted, placeholder));
        }

        let mut parts = clauses::conditions(stmt)?;
        if parts.is_empty() && !stmt.config.allow_global_update {
            return Err(DbError::MissingWhereClause);
        }
        parts.extend(clauses::soft_delete_scope(stmt));

        stmt.sql = format!(
            "UPDATE {} SET {}{}",
            table,
            sets.join(", "),
            clauses::where_sql(&parts)
        );
        Ok(())
    }
}
