use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::logger::LogLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub logger: LoggerConfig,
    /// Build and trace statements without touching the connection pool
    pub dry_run: bool,
    pub skip_default_callbacks: bool,
    pub skip_timestamps: bool,
    /// Allow UPDATE/DELETE statements without WHERE conditions
    pub allow_global_update: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub slow_threshold_ms: u64,
    pub colorful: bool,
}

impl Config {
    pub fn from_env() -> Self {
        // Pick up a local .env when present
        let _ = dotenvy::dotenv();

        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    /// Parse a YAML document; omitted keys are an error
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    fn with_env_overrides(mut self) -> Self {
        // Logger overrides
        if let Some(level) = env::var("LOG_LEVEL").ok().and_then(|v| LogLevel::parse(&v)) {
            self.logger.level = level;
        }
        if let Ok(v) = env::var("LOG_SLOW_THRESHOLD_MS") {
            self.logger.slow_threshold_ms = v.parse().unwrap_or(self.logger.slow_threshold_ms);
        }
        if let Ok(v) = env::var("LOG_COLORFUL") {
            self.logger.colorful = v.parse().unwrap_or(self.logger.colorful);
        }

        // Database overrides
        if let Ok(v) = env::var("DB_DRY_RUN") {
            self.dry_run = v.parse().unwrap_or(self.dry_run);
        }
        if let Ok(v) = env::var("DB_SKIP_DEFAULT_CALLBACKS") {
            self.skip_default_callbacks = v.parse().unwrap_or(self.skip_default_callbacks);
        }
        if let Ok(v) = env::var("DB_SKIP_TIMESTAMPS") {
            self.skip_timestamps = v.parse().unwrap_or(self.skip_timestamps);
        }
        if let Ok(v) = env::var("DB_ALLOW_GLOBAL_UPDATE") {
            self.allow_global_update = v.parse().unwrap_or(self.allow_global_update);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            logger: LoggerConfig {
                level: LogLevel::Info,
                slow_threshold_ms: 100,
                colorful: true,
            },
            dry_run: false,
            skip_default_callbacks: false,
            skip_timestamps: false,
            allow_global_update: false,
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            logger: LoggerConfig {
                level: LogLevel::Warn,
                slow_threshold_ms: 200,
                colorful: false,
            },
            dry_run: false,
            skip_default_callbacks: false,
            skip_timestamps: false,
            allow_global_update: false,
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            logger: LoggerConfig {
                level: LogLevel::Warn,
                slow_threshold_ms: 1000,
                colorful: false,
            },
            dry_run: false,
            skip_default_callbacks: false,
            skip_timestamps: false,
            allow_global_update: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::development()
    }
}

// Global default config - initialized once on first use
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

// Convenience function for accessing config
pub fn config() -> &'static Config {
    &CONFIG
}
