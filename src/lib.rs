pub mod callbacks;
pub mod config;
pub mod database;
pub mod error;
pub mod logger;
pub mod types;

pub use callbacks::{CallbackError, CallbackHandler, Callbacks, ExecResult, Processor, Statement};
pub use config::Config;
pub use database::{ConnPool, Db};
pub use error::DbError;
pub use logger::{LogLevel, Logger, TracingLogger};
pub use types::Operation;
