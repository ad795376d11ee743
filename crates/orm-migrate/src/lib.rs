//! Ordered, idempotent, reversible schema migrations.
//!
//! A migration unit is a `<id>_<description>.sql` (or, for programmatic
//! units, any other extension) file in a configured directory. [`runner`]
//! discovers units, reconciles them against a history table via
//! [`orm_dialect::Dialect`]'s history DDL, and applies or reverts them one
//! transaction at a time.

pub mod error;
pub mod registry;
mod runner;
mod unit;

pub use error::MigrationError;
pub use registry::{register_programmatic, ProgrammaticMigration};
pub use runner::{create, down, ensure_history_table, history, status, up, HistoryEntry, UnitStatus};
pub use unit::{discover_units, MigrationUnit, UnitBody};
