pub mod db;
pub mod dialect;
pub mod pool;
pub mod schema;

pub use db::{Db, DbBuilder};
pub use dialect::{Dialector, PostgresDialect};
pub use pool::ConnPool;
pub use schema::{JsonSchemaParser, Schema, SchemaParser};
