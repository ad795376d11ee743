//! Entity metadata reflection and cache.
//!
//! This crate is the foundation layer: [`model::Model`] and
//! [`value::Value`] are the contract every other crate in the workspace
//! builds on. [`cache::parse`] turns a `Model` into canonical
//! [`metadata::EntityMetadata`], memoized for the process lifetime.

pub mod annotation;
pub mod cache;
pub mod error;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod value;

pub use cache::{clear, parse, parse_instance};
pub use error::{FieldError, ParseError};
pub use metadata::{ColumnMetadata, EntityMetadata, RelationKind, RelationMetadata};
pub use model::{DeclaredType, FieldDescriptor, Model};
pub use value::Value;
