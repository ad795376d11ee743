//! Backend dialect profiles: placeholder grammar, identifier quoting,
//! pagination, and migration-history DDL, parametric over [`DriverTag`].

pub mod dialect;
pub mod error;
pub mod registry;
pub mod tag;

pub use dialect::{
    Dialect, MsSqlDialect, MySqlDialect, PaginateRequest, PaginateResult, PostgresDialect,
    SqliteDialect,
};
pub use error::DialectError;
pub use registry::dialect_for;
pub use tag::DriverTag;
