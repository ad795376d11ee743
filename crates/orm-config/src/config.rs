//! Configuration sections and layered loading.
//!
//! [`OrmConfig`] is assembled from three sources, lowest precedence first:
//! programmatic defaults, a YAML file, then `ORM_`-prefixed environment
//! variables. `database.driver` and `database.dsn` are required; every
//! other field has a default.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while assembling or validating [`OrmConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("missing required configuration field 'database.{0}'")]
    MissingField(&'static str),

    #[error("unknown driver tag '{0}' in 'database.driver'")]
    UnknownDriver(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Connection and pool-tuning parameters. Pool fields are
/// accepted and validated for every backend even though the SQLite driver
/// shipped in this workspace has no pool to tune (a single `Mutex`-guarded
/// connection) -- `max_idle_connections` etc. are simply unused there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    /// The registered driver tag (`sqlite`, `postgres`, `mysql`, `mssql`,
    /// `mongodb`). Left empty (and rejected by [`load`]) rather than given
    /// a default, since no driver is a sensible default.
    #[serde(default)]
    pub driver: String,

    /// The backend-specific connection string.
    #[serde(default)]
    pub dsn: String,

    #[serde(default = "default_max_open_connections")]
    pub max_open_connections: u32,

    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: u32,

    /// Maximum lifetime of a pooled connection, in seconds. `0` means
    /// unlimited.
    #[serde(default)]
    pub max_connection_lifetime_secs: u64,

    /// Maximum idle time of a pooled connection, in seconds. `0` means
    /// unlimited.
    #[serde(default)]
    pub max_connection_idle_time_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            driver: String::new(),
            dsn: String::new(),
            max_open_connections: default_max_open_connections(),
            max_idle_connections: default_max_idle_connections(),
            max_connection_lifetime_secs: 0,
            max_connection_idle_time_secs: 0,
        }
    }
}

fn default_max_open_connections() -> u32 {
    10
}

fn default_max_idle_connections() -> u32 {
    2
}

impl DatabaseConfig {
    /// Parses `driver` into a [`DriverTag`](orm_dialect::DriverTag).
    pub fn driver_tag(&self) -> Result<orm_dialect::DriverTag> {
        orm_dialect::DriverTag::parse(&self.driver)
            .ok_or_else(|| ConfigError::UnknownDriver(self.driver.clone()))
    }
}

/// Logging configuration, consumed to configure
/// `tracing-subscriber` at process startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"text"` or `"json"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Migration runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MigrationConfig {
    #[serde(default = "default_migration_directory")]
    pub directory: String,

    #[serde(default = "default_history_table")]
    pub history_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        MigrationConfig {
            directory: default_migration_directory(),
            history_table: default_history_table(),
        }
    }
}

fn default_migration_directory() -> String {
    "migrations".to_string()
}

fn default_history_table() -> String {
    "schema_migrations".to_string()
}

/// The full configuration object. `database.driver`/`database.dsn` default
/// to empty strings at the deserialization layer but are rejected by
/// [`load`]'s post-extract validation -- there is no sensible default DSN,
/// so "absent" and "invalid" are reported the same way rather than
/// surfacing as a raw deserialization error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OrmConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Partial defaults merged in ahead of the file and environment layers.
/// `database` is intentionally absent -- it has no sensible default DSN.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Defaults {
    logging: LoggingConfig,
    migration: MigrationConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            logging: LoggingConfig::default(),
            migration: MigrationConfig::default(),
        }
    }
}

/// Loads [`OrmConfig`] with precedence environment > file > defaults.
/// `file` need not exist; a missing file simply leaves the file layer
/// empty. Environment variables are read with the `ORM_` prefix and `__`
/// as the nesting separator, e.g. `ORM_DATABASE__DSN`.
pub fn load(file: &Path) -> Result<OrmConfig> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Defaults::default()))
        .merge(Yaml::file(file))
        .merge(Env::prefixed("ORM_").split("__"));

    let config: OrmConfig = figment.extract()?;
    if config.database.driver.is_empty() {
        return Err(ConfigError::MissingField("driver"));
    }
    if config.database.dsn.is_empty() {
        return Err(ConfigError::MissingField("dsn"));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_logging_and_migration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orm.yaml");
        std::fs::write(
            &path,
            "database:\n  driver: sqlite\n  dsn: \"file:test.db\"\n",
        )
        .unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.database.driver, "sqlite");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.migration.history_table, "schema_migrations");
    }

    #[test]
    fn missing_required_fields_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orm.yaml");
        std::fs::write(&path, "logging:\n  level: debug\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("driver")));
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orm.yaml");
        std::fs::write(
            &path,
            "database:\n  driver: sqlite\n  dsn: \"file:test.db\"\nlogging:\n  level: warn\n",
        )
        .unwrap();

        unsafe {
            std::env::set_var("ORM_LOGGING__LEVEL", "trace");
        }
        let config = load(&path).unwrap();
        unsafe {
            std::env::remove_var("ORM_LOGGING__LEVEL");
        }
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn driver_tag_rejects_unknown_driver() {
        let db = DatabaseConfig {
            driver: "oracle".to_string(),
            dsn: "dsn".to_string(),
            max_open_connections: 10,
            max_idle_connections: 2,
            max_connection_lifetime_secs: 0,
            max_connection_idle_time_secs: 0,
        };
        assert!(matches!(db.driver_tag(), Err(ConfigError::UnknownDriver(_))));
    }
}
