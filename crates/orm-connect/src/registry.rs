//! Process-wide driver factory registries, keyed by [`DriverTag`].
//!
//! Mirrors the migration registry's `OnceLock<RwLock<HashMap<..>>>` shape
//! used throughout this workspace for process-lifetime registries.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use orm_dialect::DriverTag;

use crate::context::OpContext;
use crate::error::{ConnectError, Result};
use crate::traits::{DataSource, DocumentStore};

type RelationalFactory = Arc<dyn Fn(&str, &OpContext) -> Result<Arc<dyn DataSource>> + Send + Sync>;
type DocumentFactory = Arc<dyn Fn(&str, &OpContext) -> Result<Arc<dyn DocumentStore>> + Send + Sync>;

fn relational_registry() -> &'static RwLock<HashMap<DriverTag, RelationalFactory>> {
    static REGISTRY: OnceLock<RwLock<HashMap<DriverTag, RelationalFactory>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn document_registry() -> &'static RwLock<HashMap<DriverTag, DocumentFactory>> {
    static REGISTRY: OnceLock<RwLock<HashMap<DriverTag, DocumentFactory>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a relational driver factory for `tag`. Fails if `tag` already
/// has a registration; drivers never shadow one another.
pub fn register_relational_driver<F>(tag: DriverTag, factory: F) -> Result<()>
where
    F: Fn(&str, &OpContext) -> Result<Arc<dyn DataSource>> + Send + Sync + 'static,
{
    let mut registry = relational_registry()
        .write()
        .expect("relational driver registry lock poisoned");
    if registry.contains_key(&tag) {
        return Err(ConnectError::DuplicateRegistration(tag.as_str().to_string()));
    }
    registry.insert(tag, Arc::new(factory));
    Ok(())
}

/// Opens a relational connection via the factory registered for `tag`.
pub fn connect_relational(
    tag: DriverTag,
    dsn: &str,
    ctx: &OpContext,
) -> Result<Arc<dyn DataSource>> {
    let registry = relational_registry()
        .read()
        .expect("relational driver registry lock poisoned");
    let factory = registry
        .get(&tag)
        .ok_or_else(|| ConnectError::UnknownDriver(tag.as_str().to_string()))?;
    factory(dsn, ctx)
}

/// Registers a document-store driver factory for `tag`.
pub fn register_document_driver<F>(tag: DriverTag, factory: F) -> Result<()>
where
    F: Fn(&str, &OpContext) -> Result<Arc<dyn DocumentStore>> + Send + Sync + 'static,
{
    let mut registry = document_registry()
        .write()
        .expect("document driver registry lock poisoned");
    if registry.contains_key(&tag) {
        return Err(ConnectError::DuplicateRegistration(tag.as_str().to_string()));
    }
    registry.insert(tag, Arc::new(factory));
    Ok(())
}

/// Opens a document-store connection via the factory registered for `tag`.
pub fn connect_document(
    tag: DriverTag,
    dsn: &str,
    ctx: &OpContext,
) -> Result<Arc<dyn DocumentStore>> {
    let registry = document_registry()
        .read()
        .expect("document driver registry lock poisoned");
    let factory = registry
        .get(&tag)
        .ok_or_else(|| ConnectError::UnknownDriver(tag.as_str().to_string()))?;
    factory(dsn, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteDataSource;
    use std::sync::Mutex;

    // The registries are process-global; this is the only test in the
    // crate that registers a driver, so ordering against other tests is
    // not a concern.
    static REGISTRATION_GATE: Mutex<()> = Mutex::new(());

    #[test]
    fn duplicate_registration_is_rejected() {
        let _guard = REGISTRATION_GATE.lock().unwrap();
        let factory = |dsn: &str, _ctx: &OpContext| {
            SqliteDataSource::open(dsn)
                .map(|ds| Arc::new(ds) as Arc<dyn DataSource>)
                .map_err(|e| ConnectError::Open(e.to_string()))
        };
        let first = register_relational_driver(DriverTag::Sqlite, factory);
        let second = register_relational_driver(DriverTag::Sqlite, factory);
        assert!(first.is_ok());
        assert!(matches!(second, Err(ConnectError::DuplicateRegistration(_))));
    }

    #[test]
    fn unknown_driver_is_reported() {
        let ctx = OpContext::background();
        let err = connect_relational(DriverTag::MsSql, "dsn", &ctx);
        // mssql has no concrete DataSource in this workspace.
        assert!(err.is_err());
    }
}
