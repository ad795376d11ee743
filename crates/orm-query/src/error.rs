//! Query builder error types.

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Metadata(#[from] orm_core::ParseError),

    #[error(transparent)]
    Crud(#[from] orm_crud::CrudError),

    #[error(transparent)]
    Dialect(#[from] orm_dialect::DialectError),

    #[error(transparent)]
    Connect(#[from] orm_connect::ConnectError),

    #[error("unknown field '{0}' referenced by the query builder")]
    UnknownField(String),

    /// Nested (dotted) preload paths are rejected at registration time.
    #[error("nested preload path '{0}' is not supported")]
    NestedPreloadRejected(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;
