use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::Config;
use crate::database::dialect::Dialector;
use crate::database::pool::ConnPool;
use crate::database::schema::{Schema, SchemaParser};
use crate::error::DbError;
use crate::types::Operation;

/// Shape of the destination value, resolved once before the chain runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReflectValue {
    #[default]
    Invalid,
    Struct,
    Slice { len: usize },
    Scalar,
}

impl ReflectValue {
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => ReflectValue::Invalid,
            Some(Value::Object(_)) => ReflectValue::Struct,
            Some(Value::Array(items)) => ReflectValue::Slice { len: items.len() },
            Some(_) => ReflectValue::Scalar,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, ReflectValue::Invalid)
    }
}

/// Equality condition rendered into WHERE clauses by the default callbacks
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

/// Per-call execution context that flows through a callback chain.
///
/// One statement is created per operation and discarded once the chain has
/// run; handlers read and mutate it freely.
pub struct Statement {
    pub id: Uuid,
    pub operation: Operation,

    /// Target table; empty until set explicitly or by a handler
    pub table: String,
    pub model: Option<Value>,
    pub dest: Option<Value>,
    pub schema: Option<Schema>,
    pub reflect_value: ReflectValue,

    pub conditions: Vec<Condition>,
    /// Skip the soft-delete scope
    pub unscoped: bool,

    // Built statement
    pub sql: String,
    pub vars: Vec<Value>,

    pub rows_affected: i64,
    pub errors: Vec<DbError>,
    pub start_time: Instant,

    /// Configuration snapshot taken when the statement was created
    pub config: Config,

    dialect: Arc<dyn Dialector>,
    parser: Arc<dyn SchemaParser>,
    pool: Option<Arc<dyn ConnPool>>,

    // Type-safe storage for cross-handler communication
    metadata: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl Statement {
    pub fn new(
        operation: Operation,
        config: Config,
        dialect: Arc<dyn Dialector>,
        parser: Arc<dyn SchemaParser>,
        pool: Option<Arc<dyn ConnPool>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation,
            table: String::new(),
            model: None,
            dest: None,
            schema: None,
            reflect_value: ReflectValue::Invalid,
            conditions: Vec::new(),
            unscoped: false,
            sql: String::new(),
            vars: Vec::new(),
            rows_affected: 0,
            errors: Vec::new(),
            start_time: Instant::now(),
            config,
            dialect,
            parser,
            pool,
            metadata: HashMap::new(),
        }
    }

    // === Builder-style setters ===

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn model(mut self, model: Value) -> Self {
        self.model = Some(model);
        self
    }

    pub fn dest(mut self, dest: Value) -> Self {
        self.dest = Some(dest);
        self
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn raw(mut self, sql: impl Into<String>, vars: Vec<Value>) -> Self {
        self.sql = sql.into();
        self.vars = vars;
        self
    }

    pub fn unscoped(mut self) -> Self {
        self.unscoped = true;
        self
    }

    // === Collaborators ===

    pub fn dialect(&self) -> &dyn Dialector {
        self.dialect.as_ref()
    }

    pub fn pool(&self) -> Option<&dyn ConnPool> {
        self.pool.as_deref()
    }

    pub(crate) fn parser(&self) -> Arc<dyn SchemaParser> {
        Arc::clone(&self.parser)
    }

    // === Error accumulation ===

    /// Errors accumulate in order; none is ever overwritten
    pub fn add_error(&mut self, error: DbError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    // === SQL building helpers ===

    /// Append a bind variable and return its placeholder
    pub fn add_var(&mut self, value: Value) -> String {
        self.vars.push(value);
        self.dialect.bind_var(self.vars.len())
    }

    pub fn quote(&self, ident: &str) -> String {
        self.dialect.quote(ident)
    }

    /// Current SQL with its variables rendered inline
    pub fn explain(&self) -> String {
        self.dialect.explain(&self.sql, &self.vars)
    }

    // === Destination helpers ===

    /// Objects held by the destination, whether it is a single object or a list
    pub fn dest_rows(&self) -> Vec<&Map<String, Value>> {
        match &self.dest {
            Some(Value::Object(map)) => vec![map],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            _ => Vec::new(),
        }
    }

    pub fn dest_rows_mut(&mut self) -> Vec<&mut Map<String, Value>> {
        match &mut self.dest {
            Some(Value::Object(map)) => vec![map],
            Some(Value::Array(items)) => items.iter_mut().filter_map(Value::as_object_mut).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a table or caller-supplied SQL already identifies what the statement touches
    pub fn has_target(&self) -> bool {
        !self.table.is_empty() || !self.sql.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.schema
            .as_ref()
            .map_or(false, |schema| schema.has_field(column))
    }

    // === Typed metadata ===

    pub fn set_metadata<T: Send + 'static>(&mut self, data: T) {
        self.metadata.insert(TypeId::of::<T>(), Box::new(data));
    }

    pub fn get_metadata<T: Send + 'static>(&self) -> Option<&T> {
        self.metadata
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    pub fn get_metadata_mut<T: Send + 'static>(&mut self) -> Option<&mut T> {
        self.metadata
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("id", &self.id)
            .field("operation", &self.operation)
            .field("table", &self.table)
            .field("sql", &self.sql)
            .field("vars", &self.vars)
            .field("rows_affected", &self.rows_affected)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

/// Caller-visible outcome of one processor run
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub success: bool,
    pub errors: Vec<DbError>,
    pub rows_affected: i64,
    pub execution_time: Duration,
}

impl ExecResult {
    /// First error recorded during the run
    pub fn error(&self) -> Option<&DbError> {
        self.errors.first()
    }

    pub fn into_result(self) -> Result<i64, DbError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.rows_affected),
        }
    }
}
