// Create SQL executor - builds and runs INSERT statements
use serde_json::Value;

use crate::callbacks::context::Statement;
use crate::callbacks::traits::CallbackHandler;
use crate::error::DbError;

use super::clauses;

/// Inserts every object held by the destination, one VALUES row each
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateSqlExecutor;

impl CallbackHandler for CreateSqlExecutor {
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

impl CreateSqlExecutor {
    fn build(&self, stmt: &mut Statement) -> Result<(), DbError> {
        let table = clauses::table(stmt)?;
        let columns = stmt
            .schema
            .as_ref()
            .map(|schema| schema.fields.clone())
            .unwrap_or_default();
        if columns.is_empty() {
            return Err(DbError::Schema(format!("nothing to insert into {}", stmt.table)));
        }

        let rows: Vec<Vec<Value>> = stmt
            .dest_rows()
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        if rows.is_empty() {
            return Err(DbError::Schema(format!("nothing to insert into {}", stmt.table)));
        }

        let quoted: Vec<String> = columns.iter().map(|c| stmt.quote(c)).collect();
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let placeholders: Vec<String> = row.into_iter().map(|v| stmt.add_var(v)).collect();
            values.push(format!("({})", placeholders.join(", ")));
        }

        stmt.sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            table,
            quoted.join(", "),
            values.join(", ")
        );
        Ok(())
    }
}
