//! Maps a relational [`DriverTag`] to its static [`Dialect`] profile.
//!
//! Unlike the connection-factory registries in `orm-connect`, dialect
//! profiles are fixed for the four relational backends this workspace
//! knows about, so no runtime registration is needed here.

use crate::dialect::{Dialect, MsSqlDialect, MySqlDialect, PostgresDialect, SqliteDialect};
use crate::error::{DialectError, Result};
use crate::tag::DriverTag;

/// Returns the dialect profile for a relational driver tag.
///
/// # Errors
/// Returns [`DialectError::UnknownDriver`] for `DriverTag::MongoDb`, which
/// has no relational dialect.
pub fn dialect_for(tag: DriverTag) -> Result<&'static dyn Dialect> {
    match tag {
        DriverTag::Sqlite => Ok(&SqliteDialect),
        DriverTag::Postgres => Ok(&PostgresDialect),
        DriverTag::MySql => Ok(&MySqlDialect),
        DriverTag::MsSql => Ok(&MsSqlDialect),
        DriverTag::MongoDb => Err(DialectError::UnknownDriver(tag.as_str().to_string())),
    }
}
