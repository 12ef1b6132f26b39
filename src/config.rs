//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Highest number of bound parameters SQLite accepts in one statement.
pub const SQLITE_MAX_BIND_PARAMETERS: usize = 32_766;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

impl ServerConfig {
    /// Socket address string to bind, e.g. "127.0.0.1:8080"
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// How long a query waits for a free connection before failing
    pub acquire_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

/// Users' comments query limits
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Maximum distinct usernames accepted in one request
    pub max_usernames: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (USERCOMMENTS__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "data/usercomments.db")?
            .set_default("database.max_connections", 5)?
            .set_default("database.acquire_timeout_seconds", 5)?
            .set_default("query.max_usernames", 100)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("USERCOMMENTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Configuration for tests and local tooling: a database at `path`
    /// and defaults for everything else.
    pub fn with_database_path(path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                path: path.into(),
                max_connections: 5,
                acquire_timeout_seconds: 5,
            },
            query: QueryConfig { max_usernames: 100 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.database.max_connections == 0 {
            return Err(crate::error::AppError::Config(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }

        if self.database.acquire_timeout_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "database.acquire_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.query.max_usernames == 0 || self.query.max_usernames > SQLITE_MAX_BIND_PARAMETERS
        {
            return Err(crate::error::AppError::Config(format!(
                "query.max_usernames must be between 1 and {}",
                SQLITE_MAX_BIND_PARAMETERS
            )));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(crate::error::AppError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig::with_database_path("/tmp/usercomments-test.db")
    }

    #[test]
    fn validate_accepts_defaults() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind_addr(), "127.0.0.1:0");
    }

    #[test]
    fn validate_rejects_zero_connections() {
        let mut config = valid_config();
        config.database.max_connections = 0;

        let error = config
            .validate()
            .expect_err("a pool without connections must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("database.max_connections")
        ));
    }

    #[test]
    fn validate_rejects_username_limit_above_bind_limit() {
        let mut config = valid_config();
        config.query.max_usernames = SQLITE_MAX_BIND_PARAMETERS + 1;

        let error = config
            .validate()
            .expect_err("limits SQLite cannot bind must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("query.max_usernames")
        ));
    }

    #[test]
    fn validate_rejects_unknown_log_format() {
        let mut config = valid_config();
        config.logging.format = "xml".to_string();

        assert!(config.validate().is_err());
    }
}
