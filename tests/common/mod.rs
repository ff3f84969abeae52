#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Instant;

use monk_callbacks::{Config, ConnPool, Db, DbError, LogLevel, Logger};
use parking_lot::Mutex;
use serde_json::{Map, Value};

static TRACING: Once = Once::new();

/// Install a test subscriber once; honours RUST_LOG
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Connection pool that records every statement it receives
#[derive(Default)]
pub struct RecordingPool {
    pub executed: Mutex<Vec<(String, Vec<Value>)>>,
    pub rows: Mutex<Vec<Map<String, Value>>>,
    pub affected: Mutex<i64>,
}

impl RecordingPool {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        let pool = Self::default();
        *pool.rows.lock() = rows
            .into_iter()
            .filter_map(|row| row.as_object().cloned())
            .collect();
        pool
    }

    pub fn statements(&self) -> Vec<String> {
        self.executed.lock().iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub fn last(&self) -> Option<(String, Vec<Value>)> {
        self.executed.lock().last().cloned()
    }
}

impl ConnPool for RecordingPool {
    fn exec(&self, sql: &str, vars: &[Value]) -> Result<i64, DbError> {
        self.executed.lock().push((sql.to_string(), vars.to_vec()));
        Ok(*self.affected.lock())
    }

    fn query(&self, sql: &str, vars: &[Value]) -> Result<Vec<Map<String, Value>>, DbError> {
        self.executed.lock().push((sql.to_string(), vars.to_vec()));
        Ok(self.rows.lock().clone())
    }
}

/// Logger that keeps every message for assertions
#[derive(Default)]
pub struct RecordingLogger {
    pub messages: Mutex<Vec<(LogLevel, String)>>,
    pub traces: Mutex<Vec<(String, i64, Option<DbError>)>>,
}

impl RecordingLogger {
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str) {
        self.messages.lock().push((LogLevel::Info, message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.messages.lock().push((LogLevel::Warn, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.messages.lock().push((LogLevel::Error, message.to_string()));
    }

    fn trace(&self, _begin: Instant, fc: &dyn Fn() -> (String, i64), err: Option<&DbError>) {
        let (sql, rows) = fc();
        self.traces.lock().push((sql, rows, err.cloned()));
    }
}

pub struct TestDb {
    pub db: Db,
    pub pool: Arc<RecordingPool>,
    pub logger: Arc<RecordingLogger>,
}

/// Handle with default callbacks, a recording pool and a recording logger
pub fn test_db() -> TestDb {
    test_db_with(Config::development(), RecordingPool::default())
}

pub fn test_db_with(config: Config, pool: RecordingPool) -> TestDb {
    init_tracing();
    let pool = Arc::new(pool);
    let logger = Arc::new(RecordingLogger::default());
    let db = Db::builder()
        .config(config)
        .pool(pool.clone())
        .logger(logger.clone())
        .build()
        .expect("default callbacks compile");
    TestDb { db, pool, logger }
}

/// Handle without default callbacks
pub fn bare_db() -> TestDb {
    let config = Config {
        skip_default_callbacks: true,
        ..Config::development()
    };
    test_db_with(config, RecordingPool::default())
}
