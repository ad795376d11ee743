//! Connection-layer error types.

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    #[error("failed to open connection: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("unregistered relational driver: {0}")]
    UnknownDriver(String),

    #[error("duplicate registration for driver: {0}")]
    DuplicateRegistration(String),

    #[error("column {0} not found in row")]
    ColumnNotFound(String),

    #[error(transparent)]
    Dialect(#[from] orm_dialect::DialectError),

    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, ConnectError>;
