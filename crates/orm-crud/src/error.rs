//! CRUD-layer error types.

#[derive(Debug, thiserror::Error)]
pub enum CrudError {
    #[error(transparent)]
    Metadata(#[from] orm_core::ParseError),

    #[error(transparent)]
    Field(#[from] orm_core::FieldError),

    #[error(transparent)]
    Connect(#[from] orm_connect::ConnectError),

    #[error(transparent)]
    Dialect(#[from] orm_dialect::DialectError),

    /// CRUD operations require exactly one primary-key column; composite
    /// keys are out of scope for this engine.
    #[error("{type_name}: composite primary keys are not supported by the CRUD engine")]
    CompositeKeyUnsupported { type_name: String },

    #[error("{type_name}: no primary key column is declared")]
    MissingPrimaryKey { type_name: String },

    /// Update/Delete require a populated (non-zero) primary key on the
    /// instance.
    #[error("{type_name}: operation requires a non-zero primary key value")]
    ZeroIdentity { type_name: String },

    #[error("row is missing expected column '{0}'")]
    MissingColumn(String),

    /// Update/Delete affected no row: the primary key doesn't match an
    /// existing row, or (for a soft delete) the row was already deleted.
    #[error("{type_name}: no row matched the given primary key")]
    NotFound { type_name: String },

    /// Update/Delete affected more than one row, which can only mean the
    /// primary key is not actually unique in the backend.
    #[error("{type_name}: statement affected {rows} rows, expected at most one")]
    Integrity { type_name: String, rows: u64 },

    /// A `find` filter fragment must contain exactly one `?` placeholder;
    /// zero or more than one is rejected rather than silently mis-binding
    /// arguments.
    #[error("filter fragment '{0}' must contain exactly one placeholder")]
    InvalidFilter(String),

    /// Auto-assigned identity returned by the backend does not fit the
    /// primary key's declared (narrower-than-i64) type.
    #[error("{type_name}: auto-assigned identity {value} overflows the declared column type")]
    IdentityOverflow { type_name: String, value: i64 },
}

pub type Result<T> = std::result::Result<T, CrudError>;
