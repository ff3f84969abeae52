// Clause helpers shared by the SQL executors
use serde_json::Value;

use crate::callbacks::context::{Condition, Statement};
use crate::database::schema::{validate_column, validate_table, DELETED_AT, PRIMARY_KEY};
use crate::error::DbError;

/// Quoted, validated table name of the statement
pub fn table(stmt: &Statement) -> Result<String, DbError> {
    validate_table(&stmt.table)?;
    Ok(stmt.quote(&stmt.table))
}

/// Render the statement's equality conditions, binding their values.
///
/// When no condition was given, a primary key found on the destination
/// object is used instead.
pub fn conditions(stmt: &mut Statement) -> Result<Vec<String>, DbError> {
    let mut conditions = stmt.conditions.clone();
    if conditions.is_empty() {
        let id = stmt
            .dest_rows()
            .first()
            .and_then(|row| row.get(PRIMARY_KEY))
            .filter(|id| !id.is_null())
            .cloned();
        if let Some(id) = id {
            conditions.push(Condition {
                column: PRIMARY_KEY.to_string(),
                value: id,
            });
        }
    }

    let mut parts = Vec::with_capacity(conditions.len());
    for condition in conditions {
        validate_column(&condition.column)?;
        let column = stmt.quote(&condition.column);
        if condition.value.is_null() {
            parts.push(format!("{} IS NULL", column));
        } else {
            let placeholder = stmt.add_var(condition.value);
            parts.push(format!("{} = {}", column, placeholder));
        }
    }
    Ok(parts)
}

/// `"deleted_at" IS NULL` for soft-delete models, unless the statement is unscoped
pub fn soft_delete_scope(stmt: &Statement) -> Option<String> {
    if stmt.unscoped || !stmt.schema.as_ref().map_or(false, |s| s.soft_delete()) {
        return None;
    }
    Some(format!("{} IS NULL", stmt.quote(DELETED_AT)))
}

pub fn where_sql(parts: &[String]) -> String {
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// Hand the built statement to the connection pool and record rows affected
pub fn exec(stmt: &mut Statement) -> Result<(), DbError> {
    if stmt.config.dry_run {
        tracing::debug!("Dry run, not executing: {}", stmt.sql);
        return Ok(());
    }
    let pool = stmt.pool().ok_or(DbError::ConnectionNotConfigured)?;
    let rows = pool.exec(&stmt.sql, &stmt.vars)?;
    stmt.rows_affected = rows;
    Ok(())
}

/// Run the built query and store its rows in `dest`
pub fn query(stmt: &mut Statement) -> Result<(), DbError> {
    if stmt.config.dry_run {
        tracing::debug!("Dry run, not querying: {}", stmt.sql);
        return Ok(());
    }
    let pool = stmt.pool().ok_or(DbError::ConnectionNotConfigured)?;
    let rows = pool.query(&stmt.sql, &stmt.vars)?;
    stmt.rows_affected = rows.len() as i64;
    stmt.dest = Some(Value::Array(rows.into_iter().map(Value::Object).collect()));
    Ok(())
}
