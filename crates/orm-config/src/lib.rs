//! Layered configuration: `database`, `logging`, and `migration`
//! sections loaded from defaults, an optional YAML file, and environment
//! variables, in ascending precedence.

mod config;

pub use config::{
    load, ConfigError, DatabaseConfig, LoggingConfig, MigrationConfig, OrmConfig, Result,
};
