//! The dynamic value type that flows between record fields, SQL arguments,
//! and scanned result rows.
//!
//! Every backend-facing layer (dialect, CRUD engine, query builder,
//! migration runner) speaks [`Value`] rather than a backend's native type,
//! so the core stays dialect-agnostic.

use chrono::{DateTime, Utc};

/// A dynamically-typed database value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Blob(Vec<u8>),
    DateTime(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Best-effort coercion to `i64`, used for primary-key comparisons and
    /// identity write-back.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            Value::F64(v) => Some(*v as i64),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// `true` if this value represents the zero-value of a primary key
    /// (absent identity), used by Update/Delete's "non-zero primary key"
    /// precondition.
    pub fn is_zero_identity(&self) -> bool {
        match self {
            Value::Null => true,
            Value::I64(0) => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I64(v as i64)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}
impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}
impl<T> From<Option<T>> for Value
where
    Value: From<T>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => Value::from(inner),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_identity() {
        assert!(Value::Null.is_zero_identity());
        assert!(Value::I64(0).is_zero_identity());
        assert!(!Value::I64(1).is_zero_identity());
        assert!(Value::Text(String::new()).is_zero_identity());
        assert!(!Value::Text("x".into()).is_zero_identity());
    }

    #[test]
    fn option_conversion() {
        let some: Value = Some(5i64).into();
        let none: Value = Option::<i64>::None.into();
        assert_eq!(some, Value::I64(5));
        assert_eq!(none, Value::Null);
    }
}
