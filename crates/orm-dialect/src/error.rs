//! Dialect-layer error types.

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum DialectError {
    #[error("pagination on this dialect requires an ORDER BY clause and no single-column primary key is available to synthesize one")]
    MissingOrderBy,

    #[error("unregistered driver tag: {0}")]
    UnknownDriver(String),

    #[error("duplicate driver registration for tag: {0}")]
    DuplicateRegistration(String),
}

pub type Result<T> = std::result::Result<T, DialectError>;
