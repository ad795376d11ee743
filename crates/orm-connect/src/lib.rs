//! Connection lifecycle, driver registries, and the SQLite [`DataSource`].
//!
//! Everything in this crate is backend-agnostic except [`sqlite`], the one
//! concrete relational implementation carried in this workspace.

pub mod context;
pub mod error;
pub mod registry;
mod sqlite;
pub mod traits;

pub use context::OpContext;
pub use error::ConnectError;
pub use registry::{
    connect_document, connect_relational, register_document_driver, register_relational_driver,
};
pub use sqlite::SqliteDataSource;
pub use traits::{DataSource, DocumentStore, ExecResult, Row, Transaction};
