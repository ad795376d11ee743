//! Migration runner error types.

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] orm_connect::ConnectError),

    #[error(transparent)]
    Dialect(#[from] orm_dialect::DialectError),

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("migration file name '{0}' does not match '<id>_<description>.<ext>'")]
    MalformedFileName(String),

    #[error("migration id '{0}' is already registered")]
    DuplicateUnit(String),

    #[error("no migration unit with id '{0}' is registered programmatically")]
    UnknownProgrammaticUnit(String),

    #[error("migration file already exists: {0}")]
    FileExists(String),

    #[error(
        "history entry '{0}' has no matching migration file on disk; down is not possible"
    )]
    MissingFileForAppliedUnit(String),

    #[error("migration '{0}' failed: {1}")]
    Failed(String, String),
}

pub type Result<T> = std::result::Result<T, MigrationError>;
