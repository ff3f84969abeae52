use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::callbacks::context::{ExecResult, Statement};
use crate::callbacks::error::CallbackError;
use crate::callbacks::implementations::register_default_callbacks;
use crate::callbacks::manager::Callbacks;
use crate::config::Config;
use crate::database::dialect::{Dialector, PostgresDialect};
use crate::database::pool::ConnPool;
use crate::database::schema::{JsonSchemaParser, SchemaParser};
use crate::logger::{Logger, TracingLogger};
use crate::types::Operation;

struct DbInner {
    config: Arc<RwLock<Config>>,
    logger: Arc<dyn Logger>,
    dialect: Arc<dyn Dialector>,
    parser: Arc<dyn SchemaParser>,
    pool: Option<Arc<dyn ConnPool>>,
    callbacks: Callbacks,
}

/// Database handle: configuration, collaborators and the callback processors.
///
/// Cloning is cheap and clones share processors; separately built handles
/// are fully isolated from each other.
#[derive(Clone)]
pub struct Db {
    inner: Arc<DbInner>,
}

impl Db {
    pub fn builder() -> DbBuilder {
        DbBuilder::default()
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.inner.callbacks
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> Config {
        self.inner.config.read().clone()
    }

    /// Mutate the configuration. Match predicates are not re-evaluated until the
    /// next registration or an explicit [`Callbacks::compile_all`].
    pub fn update_config<F>(&self, f: F)
    where
        F: FnOnce(&mut Config),
    {
        f(&mut self.inner.config.write());
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.inner.logger)
    }

    pub fn dialect(&self) -> &dyn Dialector {
        self.inner.dialect.as_ref()
    }

    /// Fresh per-call context for `operation`
    pub fn statement(&self, operation: Operation) -> Statement {
        Statement::new(
            operation,
            self.config(),
            Arc::clone(&self.inner.dialect),
            Arc::clone(&self.inner.parser),
            self.inner.pool.clone(),
        )
    }

    /// Run `stmt` through the processor of its operation kind
    pub fn execute(&self, stmt: &mut Statement) -> ExecResult {
        self.inner.callbacks.processor(stmt.operation).execute(stmt)
    }

    pub fn create(&self, table: &str, value: Value) -> (ExecResult, Statement) {
        let mut stmt = self.statement(Operation::Create).table(table).dest(value);
        let result = self.execute(&mut stmt);
        (result, stmt)
    }

    /// Query rows matching all `conditions`; the rows land in the statement's `dest`.
    ///
    /// No model is set, so the soft-delete scope does not apply. Build the
    /// statement with [`Statement::model`] for models carrying `deleted_at`.
    pub fn query(&self, table: &str, conditions: &[(&str, Value)]) -> (ExecResult, Statement) {
        let mut stmt = self.statement(Operation::Query).table(table);
        for (column, value) in conditions {
            stmt = stmt.where_eq(*column, value.clone());
        }
        let result = self.execute(&mut stmt);
        (result, stmt)
    }

    /// Update matching rows with `values`. The schema comes from `values`, so
    /// `updated_at` is only stamped when `values` carries that key; set a
    /// model on the statement to stamp it regardless.
    pub fn update(&self, table: &str, values: Value, conditions: &[(&str, Value)]) -> ExecResult {
        let mut stmt = self.statement(Operation::Update).table(table).dest(values);
        for (column, value) in conditions {
            stmt = stmt.where_eq(*column, value.clone());
        }
        self.execute(&mut stmt)
    }

    /// Hard-delete matching rows. Soft delete needs a model carrying
    /// `deleted_at`, set through [`Statement::model`].
    pub fn delete(&self, table: &str, conditions: &[(&str, Value)]) -> ExecResult {
        let mut stmt = self.statement(Operation::Delete).table(table);
        for (column, value) in conditions {
            stmt = stmt.where_eq(*column, value.clone());
        }
        self.execute(&mut stmt)
    }

    /// Run a raw query whose rows land in the statement's `dest`
    pub fn row(&self, sql: &str, vars: Vec<Value>) -> (ExecResult, Statement) {
        let mut stmt = self.statement(Operation::Row).raw(sql, vars);
        let result = self.execute(&mut stmt);
        (result, stmt)
    }

    pub fn raw(&self, sql: &str, vars: Vec<Value>) -> ExecResult {
        let mut stmt = self.statement(Operation::Raw).raw(sql, vars);
        self.execute(&mut stmt)
    }
}

/// Builder for [`Db`]; unset collaborators fall back to the defaults
#[derive(Default)]
pub struct DbBuilder {
    config: Option<Config>,
    logger: Option<Arc<dyn Logger>>,
    dialect: Option<Arc<dyn Dialector>>,
    parser: Option<Arc<dyn SchemaParser>>,
    pool: Option<Arc<dyn ConnPool>>,
}

impl DbBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn dialect(mut self, dialect: Arc<dyn Dialector>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn schema_parser(mut self, parser: Arc<dyn SchemaParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn pool(mut self, pool: Arc<dyn ConnPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Assemble the handle and, unless disabled, register the default callbacks
    pub fn build(self) -> Result<Db, CallbackError> {
        let config = self.config.unwrap_or_else(|| crate::config::config().clone());
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::from_config(&config.logger)));
        let skip_default_callbacks = config.skip_default_callbacks;
        let config = Arc::new(RwLock::new(config));

        let callbacks = Callbacks::new(Arc::clone(&config), Arc::clone(&logger));
        if !skip_default_callbacks {
            register_default_callbacks(&callbacks)?;
        }

        tracing::debug!("Database handle ready (default callbacks: {})", !skip_default_callbacks);

        Ok(Db {
            inner: Arc::new(DbInner {
                config,
                logger,
                dialect: self.dialect.unwrap_or_else(|| Arc::new(PostgresDialect)),
                parser: self.parser.unwrap_or_else(|| Arc::new(JsonSchemaParser)),
                pool: self.pool,
                callbacks,
            }),
        })
    }
}
