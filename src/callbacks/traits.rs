use std::sync::Arc;

use crate::callbacks::context::Statement;
use crate::config::Config;
use crate::error::DbError;

/// A unit of logic run against a statement as one link of a callback chain.
///
/// Returning `Err` records the error on the statement; the chain keeps going
/// either way. Closures of the right shape implement this automatically.
pub trait CallbackHandler: Send + Sync {
    fn call(&self, stmt: &mut Statement) -> Result<(), DbError>;
}

impl<F> CallbackHandler for F
where
    F: Fn(&mut Statement) -> Result<(), DbError> + Send + Sync,
{
    fn call(&self, stmt: &mut Statement) -> Result<(), DbError> {
        self(stmt)
    }
}

/// Shared, executable handler as stored in declarations and compiled lists
pub type Handler = Arc<dyn CallbackHandler>;

/// Compile-time applicability check, evaluated against the handle's configuration
pub type Matcher = Arc<dyn Fn(&Config) -> bool + Send + Sync>;
