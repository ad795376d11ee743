//! Parser for the per-field annotation grammar:
//!
//! ```text
//! primaryKey;autoIncrement;column:user_id;type:bigint;notnull
//! ```
//!
//! A semicolon-separated list of tokens, each either a bare flag or a
//! `key:value` pair. Unknown tokens are rejected with an error that names
//! the offending field.

use std::collections::HashMap;

use crate::error::ParseError;

/// One recognized bare-flag token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    PrimaryKey,
    AutoIncrement,
    NotNull,
    Unique,
    UniqueIndex,
    Index,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

/// One recognized `key:value` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Column,
    Type,
    Size,
    Default,
    Index,
    Relation,
    JoinColumn,
    JoinTable,
    MappedBy,
    Reference,
    OnDelete,
    OnUpdate,
}

/// The parsed form of one field's annotation string.
#[derive(Debug, Clone, Default)]
pub struct ParsedAnnotation {
    pub flags: Vec<Flag>,
    pub values: HashMap<Key, String>,
}

impl ParsedAnnotation {
    pub fn has(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn get(&self, key: Key) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }
}

fn flag_from_token(token: &str) -> Option<Flag> {
    Some(match token {
        "primaryKey" => Flag::PrimaryKey,
        "autoIncrement" => Flag::AutoIncrement,
        "notnull" => Flag::NotNull,
        "unique" => Flag::Unique,
        "uniqueIndex" => Flag::UniqueIndex,
        "index" => Flag::Index,
        "createdAt" => Flag::CreatedAt,
        "updatedAt" => Flag::UpdatedAt,
        "deletedAt" => Flag::DeletedAt,
        _ => return None,
    })
}

fn key_from_name(name: &str) -> Option<Key> {
    Some(match name {
        "column" => Key::Column,
        "type" => Key::Type,
        "size" => Key::Size,
        "default" => Key::Default,
        "index" => Key::Index,
        "relation" => Key::Relation,
        "joinColumn" => Key::JoinColumn,
        "joinTable" => Key::JoinTable,
        "mappedBy" => Key::MappedBy,
        "reference" => Key::Reference,
        "onDelete" => Key::OnDelete,
        "onUpdate" => Key::OnUpdate,
        _ => return None,
    })
}

/// Parses one field's annotation string. `field_name` is only used to
/// attribute errors.
pub fn parse_annotation(field_name: &str, raw: &str) -> Result<ParsedAnnotation, ParseError> {
    let mut parsed = ParsedAnnotation::default();
    for token in raw.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((key_name, value)) = token.split_once(':') {
            let key = key_from_name(key_name).ok_or_else(|| ParseError::UnknownToken {
                field: field_name.to_string(),
                token: token.to_string(),
            })?;
            parsed.values.insert(key, value.to_string());
        } else if let Some(flag) = flag_from_token(token) {
            parsed.flags.push(flag);
        } else {
            return Err(ParseError::UnknownToken {
                field: field_name.to_string(),
                token: token.to_string(),
            });
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_kv() {
        let p = parse_annotation("id", "primaryKey;autoIncrement;column:id").unwrap();
        assert!(p.has(Flag::PrimaryKey));
        assert!(p.has(Flag::AutoIncrement));
        assert_eq!(p.get(Key::Column), Some("id"));
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = parse_annotation("nome", "bogusFlag").unwrap_err();
        assert!(matches!(err, ParseError::UnknownToken { .. }));
    }

    #[test]
    fn rejects_unknown_key() {
        let err = parse_annotation("nome", "bogusKey:val").unwrap_err();
        assert!(matches!(err, ParseError::UnknownToken { .. }));
    }

    #[test]
    fn ignores_blank_segments() {
        let p = parse_annotation("nome", "unique;;notnull;").unwrap();
        assert!(p.has(Flag::Unique));
        assert!(p.has(Flag::NotNull));
    }
}
