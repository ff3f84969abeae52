// Timestamp stamping ahead of create and update
use serde_json::Value;

use crate::callbacks::context::Statement;
use crate::callbacks::traits::CallbackHandler;
use crate::database::schema::{CREATED_AT, UPDATED_AT};
use crate::error::DbError;

fn now() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

/// Fill `column` on every destination object where it is missing or null
fn stamp(stmt: &mut Statement, column: &str, value: &Value) -> usize {
    let mut stamped = 0;
    for row in stmt.dest_rows_mut() {
        let missing = row.get(column).map_or(true, Value::is_null);
        if missing {
            row.insert(column.to_string(), value.clone());
            stamped += 1;
        }
    }
    stamped
}

/// Sets `created_at` and `updated_at` on models that carry them
#[derive(Debug, Default, Clone, Copy)]
pub struct StampTimestamps;

impl CallbackHandler for StampTimestamps {
    fn call(&self, stmt: &mut Statement) -> Result<(), DbError> {
        let now = now();
        for column in [CREATED_AT, UPDATED_AT] {
            if stmt.has_column(column) {
                let stamped = stamp(stmt, column, &now);
                tracing::trace!("Stamped {} on {} rows", column, stamped);
            }
        }
        Ok(())
    }
}

/// Sets `updated_at` on update payloads for models that carry it; the key is
/// added when the payload lacks it, so the update executor writes it too
#[derive(Debug, Default, Clone, Copy)]
pub struct StampUpdatedAt;

impl CallbackHandler for StampUpdatedAt {
    fn call(&self, stmt: &mut Statement) -> Result<(), DbError> {
        if stmt.has_column(UPDATED_AT) {
            stamp(stmt, UPDATED_AT, &now());
        }
        Ok(())
    }
}
