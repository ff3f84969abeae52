// Logging collaborator used by processors for registration notices and statement traces

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::LoggerConfig;
use crate::error::DbError;

/// Verbosity for statement traces and registration notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent = 1,
    Error = 2,
    Warn = 3,
    Info = 4,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "silent" | "off" => Some(LogLevel::Silent),
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            _ => None,
        }
    }
}

pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);

    /// Record one finished statement. `fc` renders the SQL and rows affected
    /// and is only called when a record is actually emitted.
    fn trace(&self, begin: Instant, fc: &dyn Fn() -> (String, i64), err: Option<&DbError>);
}

/// Logger backed by `tracing` events
#[derive(Debug, Clone)]
pub struct TracingLogger {
    level: LogLevel,
    slow_threshold: Duration,
}

impl TracingLogger {
    pub fn new(level: LogLevel, slow_threshold_ms: u64) -> Self {
        Self {
            level,
            slow_threshold: Duration::from_millis(slow_threshold_ms),
        }
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::new(config.level, config.slow_threshold_ms)
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(LogLevel::Warn, 200)
    }
}

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        if self.level >= LogLevel::Info {
            tracing::info!("{}", message);
        }
    }

    fn warn(&self, message: &str) {
        if self.level >= LogLevel::Warn {
            tracing::warn!("{}", message);
        }
    }

    fn error(&self, message: &str) {
        if self.level >= LogLevel::Error {
            tracing::error!("{}", message);
        }
    }

    fn trace(&self, begin: Instant, fc: &dyn Fn() -> (String, i64), err: Option<&DbError>) {
        if self.level == LogLevel::Silent {
            return;
        }

        let elapsed = begin.elapsed();
        let millis = elapsed.as_secs_f64() * 1000.0;

        match err {
            Some(err) if self.level >= LogLevel::Error => {
                let (sql, rows) = fc();
                tracing::error!(elapsed_ms = millis, rows, "{} | {}", err, sql);
            }
            _ if !self.slow_threshold.is_zero()
                && elapsed > self.slow_threshold
                && self.level >= LogLevel::Warn =>
            {
                let (sql, rows) = fc();
                tracing::warn!(
                    elapsed_ms = millis,
                    rows,
                    "SLOW SQL >= {:?} | {}",
                    self.slow_threshold,
                    sql
                );
            }
            _ if self.level == LogLevel::Info => {
                let (sql, rows) = fc();
                tracing::info!(elapsed_ms = millis, rows, "{}", sql);
            }
            _ => {}
        }
    }
}
