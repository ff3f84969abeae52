// Default callbacks registered on every handle unless disabled in config.
// Each operation kind gets its SQL executor plus the hooks that feed it.

pub mod clauses;
pub mod create_sql_executor;
pub mod delete_sql_executor;
pub mod query_sql_executor;
pub mod raw_sql_executor;
pub mod timestamps;
pub mod update_sql_executor;

pub use create_sql_executor::*;
pub use delete_sql_executor::*;
pub use query_sql_executor::*;
pub use raw_sql_executor::*;
pub use timestamps::*;
pub use update_sql_executor::*;

use crate::callbacks::error::CallbackError;
use crate::callbacks::manager::Callbacks;
use crate::config::Config;

pub const CREATE: &str = "monk:create";
pub const QUERY: &str = "monk:query";
pub const UPDATE: &str = "monk:update";
pub const DELETE: &str = "monk:delete";
pub const ROW: &str = "monk:row";
pub const RAW: &str = "monk:raw";
pub const STAMP_TIMESTAMPS: &str = "monk:stamp_timestamps";
pub const STAMP_UPDATED_AT: &str = "monk:stamp_updated_at";

fn stamps_enabled(config: &Config) -> bool {
    !config.skip_timestamps
}

/// Register the default callback chain of every operation kind
pub fn register_default_callbacks(callbacks: &Callbacks) -> Result<(), CallbackError> {
    let create = callbacks.create();
    create.register(CREATE, CreateSqlExecutor)?;
    create
        .before(CREATE)
        .when(stamps_enabled)
        .register(STAMP_TIMESTAMPS, StampTimestamps)?;

    callbacks.query().register(QUERY, QuerySqlExecutor)?;

    let update = callbacks.update();
    update.register(UPDATE, UpdateSqlExecutor)?;
    update
        .before(UPDATE)
        .when(stamps_enabled)
        .register(STAMP_UPDATED_AT, StampUpdatedAt)?;

    callbacks.delete().register(DELETE, DeleteSqlExecutor)?;
    callbacks.row().register(ROW, RowSqlExecutor)?;
    callbacks.raw().register(RAW, RawSqlExecutor)?;

    tracing::debug!("Registered default callbacks");
    Ok(())
}
