//! The `Model` trait: a hand-written stand-in for compile-time reflection.
//!
//! Rust has no general runtime field reflection, so each mapped record type
//! implements [`Model`] and returns a static slice of [`FieldDescriptor`]s:
//! one per field, each carrying its annotation string plus a typed
//! getter/setter pair operating on the shared [`crate::value::Value`] enum.
//! A code-generation macro could emit this from the same annotation
//! grammar; here the descriptors are written by hand.

use std::any::TypeId;

use crate::error::FieldError;
use crate::value::Value;

/// The declared storage type of a column, independent of dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Text,
    Integer,
    BigInt,
    Real,
    Boolean,
    DateTime,
    Blob,
    Json,
}

impl DeclaredType {
    /// Whether `size:` annotations are meaningful for this type.
    pub fn accepts_size(self) -> bool {
        matches!(self, DeclaredType::Text | DeclaredType::Blob)
    }
}

/// One field's static mapping description.
pub struct FieldDescriptor<M> {
    /// Position of this field in `Model::fields()`, also used to correlate
    /// returned-column order back to a destination field during scanning.
    pub field_index: usize,
    pub field_name: &'static str,
    /// The raw semicolon-separated annotation token string.
    pub annotation: &'static str,
    pub declared_type: DeclaredType,
    /// `true` if the Rust field is `Option<T>` or otherwise a nullable
    /// wrapper, the nullability-inference input for annotation parsing.
    pub rust_option: bool,
    pub get: fn(&M) -> Value,
    pub set: fn(&mut M, Value) -> Result<(), FieldError>,
}

/// Implemented by every record type the core can map to a table.
pub trait Model: Sized + 'static {
    /// The record's display name (used to derive the default table name).
    fn type_name() -> &'static str;

    /// Type-level annotation string, e.g. `"table:widgets"`. Empty if the
    /// type carries no type-level annotation.
    fn type_annotation() -> &'static str {
        ""
    }

    /// Ordered field descriptors, one per mapped field, in declaration
    /// order.
    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Opaque stable identity used as the metadata cache key.
    fn type_id() -> TypeId {
        TypeId::of::<Self>()
    }
}
