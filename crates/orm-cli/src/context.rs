//! Runtime context: resolved configuration, an open [`DataSource`], and the
//! [`OpContext`] Ctrl+C cancels.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Once};

use anyhow::{bail, Context, Result};
use orm_connect::{connect_relational, register_relational_driver, ConnectError, DataSource, OpContext, SqliteDataSource};
use orm_dialect::DriverTag;

use crate::cli::GlobalArgs;

static REGISTER_SQLITE: Once = Once::new();

fn ensure_sqlite_registered() {
    REGISTER_SQLITE.call_once(|| {
        let _ = register_relational_driver(DriverTag::Sqlite, |dsn, _ctx| {
            SqliteDataSource::open(dsn)
                .map(|ds| Arc::new(ds) as Arc<dyn DataSource>)
                .map_err(|e| ConnectError::Open(e.to_string()))
        });
    });
}

pub struct RuntimeContext {
    pub config: orm_config::OrmConfig,
    pub data_source: Arc<dyn DataSource>,
    pub op: OpContext,
}

impl RuntimeContext {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        if global.verbose {
            tracing_subscriber::fmt()
                .with_env_filter("orm=debug")
                .with_writer(std::io::stderr)
                .init();
        }

        let config = orm_config::load(Path::new(&global.config))
            .with_context(|| format!("loading configuration from {}", global.config))?;

        ensure_sqlite_registered();
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let op = OpContext::with_cancel_flag(cancel_flag.clone());
        let tag = config
            .database
            .driver_tag()
            .context("resolving database.driver")?;
        if tag != DriverTag::Sqlite {
            bail!(
                "driver '{}' has no concrete backend registered in this build",
                config.database.driver
            );
        }
        let data_source = connect_relational(tag, &config.database.dsn, &op)
            .context("connecting to configured database")?;

        let _ = ctrlc::set_handler(move || {
            cancel_flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        Ok(RuntimeContext {
            config,
            data_source,
            op,
        })
    }

    pub fn migration_directory(&self) -> &Path {
        Path::new(&self.config.migration.directory)
    }

    pub fn history_table(&self) -> &str {
        &self.config.migration.history_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_opens_configured_sqlite_database() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("orm.yaml");
        std::fs::write(
            &config_path,
            "database:\n  driver: sqlite\n  dsn: \":memory:\"\n",
        )
        .unwrap();

        let global = GlobalArgs {
            config: config_path.display().to_string(),
            verbose: false,
        };
        let ctx = RuntimeContext::load(&global).unwrap();
        assert_eq!(ctx.migration_directory(), Path::new("migrations"));
        assert_eq!(ctx.history_table(), "schema_migrations");
    }

    #[test]
    fn load_rejects_an_unregistered_driver() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("orm.yaml");
        std::fs::write(
            &config_path,
            "database:\n  driver: postgres\n  dsn: \"postgres://localhost/db\"\n",
        )
        .unwrap();

        let global = GlobalArgs {
            config: config_path.display().to_string(),
            verbose: false,
        };
        assert!(RuntimeContext::load(&global).is_err());
    }
}
