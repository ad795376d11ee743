//! Process-wide registry for programmatic migrations, mirroring
//! `orm-connect`'s driver-factory registry shape.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use orm_connect::{OpContext, Transaction};

use crate::error::{MigrationError, Result};

/// Behavior for a migration whose unit file has a non-`.sql` extension.
/// Registered at process init under the same id prefix as its disk file.
pub trait ProgrammaticMigration: Send + Sync {
    fn up(&self, ctx: &OpContext, handle: &dyn Transaction) -> Result<()>;
    fn down(&self, ctx: &OpContext, handle: &dyn Transaction) -> Result<()>;
}

type Entry = Arc<dyn ProgrammaticMigration>;

fn registry() -> &'static RwLock<HashMap<String, Entry>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Entry>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a programmatic migration under `id`. Fails if `id` is already
/// registered.
pub fn register_programmatic(id: impl Into<String>, migration: Entry) -> Result<()> {
    let id = id.into();
    let mut registry = registry().write().expect("migration registry lock poisoned");
    if registry.contains_key(&id) {
        return Err(MigrationError::DuplicateUnit(id));
    }
    registry.insert(id, migration);
    Ok(())
}

/// Looks up the programmatic migration registered under `id`.
pub fn lookup_programmatic(id: &str) -> Option<Entry> {
    registry()
        .read()
        .expect("migration registry lock poisoned")
        .get(id)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct NoOp;
    impl ProgrammaticMigration for NoOp {
        fn up(&self, _ctx: &OpContext, _handle: &dyn Transaction) -> Result<()> {
            Ok(())
        }
        fn down(&self, _ctx: &OpContext, _handle: &dyn Transaction) -> Result<()> {
            Ok(())
        }
    }

    // The registry is process-global; serialize against other tests in
    // this module that register under distinct ids to keep the duplicate
    // check deterministic.
    static GATE: Mutex<()> = Mutex::new(());

    #[test]
    fn duplicate_registration_is_rejected() {
        let _guard = GATE.lock().unwrap();
        let first = register_programmatic("20240101000000_seed", Arc::new(NoOp));
        let second = register_programmatic("20240101000000_seed", Arc::new(NoOp));
        assert!(first.is_ok());
        assert!(matches!(second, Err(MigrationError::DuplicateUnit(_))));
    }

    #[test]
    fn unregistered_id_is_absent() {
        assert!(lookup_programmatic("never_registered").is_none());
    }
}
