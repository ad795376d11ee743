//! Metadata-layer error types.

/// Errors raised while parsing a record type's annotations into
/// [`crate::metadata::EntityMetadata`].
///
/// Parsing aggregates every violation it finds before returning, so a single
/// `ParseError::Aggregate` is the usual shape; the single-field variants
/// exist for constructors used while building that aggregate.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("field '{field}': unknown annotation token '{token}'")]
    UnknownToken { field: String, token: String },

    #[error("field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("{0}")]
    Aggregate(String),
}

/// An error produced while setting a field through its [`crate::model::FieldDescriptor`] setter.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
#[error("field '{field}': cannot assign value of this kind: {reason}")]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, ParseError>;

impl ParseError {
    /// Folds a non-empty list of errors from a single record's parse pass
    /// into one aggregate error, preserving the individual messages.
    pub fn aggregate(type_name: &str, errors: Vec<ParseError>) -> ParseError {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ParseError::Aggregate(format!("{type_name}: {joined}"))
    }
}
