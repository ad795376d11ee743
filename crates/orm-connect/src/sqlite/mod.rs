//! SQLite [`DataSource`](crate::DataSource) implementation: a single
//! mutex-guarded connection shared by the `SqliteDataSource`/`SqliteTx` pair.

mod row;
mod source;
mod transaction;
mod value_conv;

pub use source::SqliteDataSource;
