//! Conversions between [`Value`] and `rusqlite`'s dynamic value types.
//!
//! SQLite has no native datetime column type, so `DateTime` values are
//! bound and read back as RFC 3339 text.
//! Deciding whether a TEXT column should be reinterpreted as a timestamp
//! is the CRUD row scanner's job, driven by column metadata -- this layer
//! never guesses from the string shape alone.

use orm_core::Value;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

pub(crate) struct BoundValue(pub Value);

impl ToSql for BoundValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match &self.0 {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::I64(i) => ToSqlOutput::from(*i),
            Value::F64(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.clone()),
            Value::Blob(b) => ToSqlOutput::from(b.clone()),
            Value::DateTime(dt) => ToSqlOutput::from(dt.to_rfc3339()),
        })
    }
}

pub(crate) fn bind_args(args: &[Value]) -> Vec<BoundValue> {
    args.iter().cloned().map(BoundValue).collect()
}

pub(crate) fn value_from_rusqlite(raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::I64(i),
        ValueRef::Real(f) => Value::F64(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
