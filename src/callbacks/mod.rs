// Callback pipeline: ordered, conditionally registered handlers per operation kind

pub mod context;
pub mod error;
pub mod implementations;
pub mod manager;
pub mod processor;
mod sort;
pub mod traits;

// Re-export core types
pub use context::{Condition, ExecResult, ReflectValue, Statement};
pub use error::{CallbackError, Relation};
pub use manager::Callbacks;
pub use processor::{CallbackBuilder, Processor};
pub use traits::{CallbackHandler, Handler, Matcher};
