//! Canonical [`EntityMetadata`] and the `parse` operation that builds it
//! from a [`Model`]'s static field descriptors.

use std::collections::HashMap;

use crate::annotation::{self, Flag, Key};
use crate::error::ParseError;
use crate::model::{DeclaredType, Model};
use crate::naming::{default_table_name, snake_case};

/// One field's canonical mapping, after annotation parsing and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub field_index: usize,
    pub field_name: String,
    pub column_name: String,
    pub declared_type: DeclaredType,
    pub declared_size: Option<u32>,
    pub declared_default: Option<String>,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
    pub is_unique: bool,
    pub is_nullable: bool,
    pub is_created_at: bool,
    pub is_updated_at: bool,
    pub is_deleted_at: bool,
    pub index_name: Option<String>,
}

/// The kind of relationship a [`RelationMetadata`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationKind {
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "one-to-one" => RelationKind::OneToOne,
            "one-to-many" => RelationKind::OneToMany,
            "many-to-one" => RelationKind::ManyToOne,
            "many-to-many" => RelationKind::ManyToMany,
            _ => return None,
        })
    }

    /// `true` for the "owning", *-to-one sides that carry a foreign key on
    /// their own table rather than being `mappedBy` the other side.
    fn is_to_one(self) -> bool {
        matches!(self, RelationKind::OneToOne | RelationKind::ManyToOne)
    }
}

/// A validated relation declaration on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationMetadata {
    pub field_name: String,
    pub kind: RelationKind,
    pub target_type_name: String,
    pub join_column: Option<String>,
    pub join_table: Option<String>,
    pub mapped_by: Option<String>,
}

/// The canonical description of one record type, built once per type and
/// cached for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    pub name: String,
    pub table_name: String,
    pub columns: Vec<ColumnMetadata>,
    pub columns_by_field: HashMap<String, usize>,
    pub columns_by_db_name: HashMap<String, usize>,
    pub primary_key_columns: Vec<usize>,
    pub created_at_column: Option<usize>,
    pub updated_at_column: Option<usize>,
    pub deleted_at_column: Option<usize>,
    pub relations_by_field: HashMap<String, RelationMetadata>,
}

impl EntityMetadata {
    pub fn column_by_field(&self, field: &str) -> Option<&ColumnMetadata> {
        self.columns_by_field.get(field).map(|&i| &self.columns[i])
    }

    pub fn column_by_db_name(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns_by_db_name.get(name).map(|&i| &self.columns[i])
    }

    pub fn single_primary_key(&self) -> Option<&ColumnMetadata> {
        match self.primary_key_columns.as_slice() {
            [idx] => Some(&self.columns[*idx]),
            _ => None,
        }
    }

    pub fn created_at(&self) -> Option<&ColumnMetadata> {
        self.created_at_column.map(|i| &self.columns[i])
    }

    pub fn updated_at(&self) -> Option<&ColumnMetadata> {
        self.updated_at_column.map(|i| &self.columns[i])
    }

    pub fn deleted_at(&self) -> Option<&ColumnMetadata> {
        self.deleted_at_column.map(|i| &self.columns[i])
    }
}

/// Builds [`EntityMetadata`] for `M` from its static field descriptors.
/// Does not consult the cache; callers generally want
/// [`crate::cache::parse`] instead.
pub fn build<M: Model>() -> Result<EntityMetadata, ParseError> {
    let type_name = M::type_name();
    let mut errors = Vec::new();

    let table_name = parse_table_annotation(M::type_annotation())
        .unwrap_or_else(|| default_table_name(type_name));

    let mut columns = Vec::with_capacity(M::fields().len());
    let mut parsed_per_field = Vec::with_capacity(M::fields().len());

    for field in M::fields() {
        match annotation::parse_annotation(field.field_name, field.annotation) {
            Ok(parsed) => parsed_per_field.push(Some(parsed)),
            Err(e) => {
                errors.push(e);
                parsed_per_field.push(None);
            }
        }
    }

    let mut created_at_seen = None;
    let mut updated_at_seen = None;
    let mut deleted_at_seen = None;

    for (field, parsed) in M::fields().iter().zip(parsed_per_field.iter()) {
        let Some(parsed) = parsed else { continue };

        if let Some(size) = parsed.get(Key::Size) {
            if !field.declared_type.accepts_size() {
                errors.push(ParseError::InvalidField {
                    field: field.field_name.to_string(),
                    reason: format!("size:{size} is not valid on a non-sized type"),
                });
            }
        }

        let is_deleted_at = parsed.has(Flag::DeletedAt);
        let is_created_at = parsed.has(Flag::CreatedAt);
        let is_updated_at = parsed.has(Flag::UpdatedAt);

        if is_created_at && created_at_seen.is_some() {
            errors.push(ParseError::InvalidField {
                field: field.field_name.to_string(),
                reason: "duplicate createdAt column".to_string(),
            });
        }
        if is_updated_at && updated_at_seen.is_some() {
            errors.push(ParseError::InvalidField {
                field: field.field_name.to_string(),
                reason: "duplicate updatedAt column".to_string(),
            });
        }
        if is_deleted_at && deleted_at_seen.is_some() {
            errors.push(ParseError::InvalidField {
                field: field.field_name.to_string(),
                reason: "duplicate deletedAt column".to_string(),
            });
        }

        let role_count = [is_created_at, is_updated_at, is_deleted_at]
            .iter()
            .filter(|b| **b)
            .count();
        if role_count > 1 {
            errors.push(ParseError::InvalidField {
                field: field.field_name.to_string(),
                reason: "createdAt/updatedAt/deletedAt are mutually exclusive".to_string(),
            });
        }

        let explicit_notnull = parsed.has(Flag::NotNull);
        let wrapper_nullable = field.rust_option || is_deleted_at;
        let is_nullable = if explicit_notnull {
            if field.rust_option {
                errors.push(ParseError::InvalidField {
                    field: field.field_name.to_string(),
                    reason: "notnull conflicts with an Option-wrapped field".to_string(),
                });
            }
            false
        } else {
            wrapper_nullable
        };

        let column_name = parsed
            .get(Key::Column)
            .map(str::to_string)
            .unwrap_or_else(|| snake_case(field.field_name));

        let index_name = parsed
            .get(Key::Index)
            .map(str::to_string)
            .or_else(|| {
                if parsed.has(Flag::Index) || parsed.has(Flag::UniqueIndex) {
                    Some(format!("idx_{column_name}"))
                } else {
                    None
                }
            });

        let declared_size = parsed.get(Key::Size).and_then(|s| s.parse::<u32>().ok());

        let column = ColumnMetadata {
            field_index: field.field_index,
            field_name: field.field_name.to_string(),
            column_name,
            declared_type: parsed
                .get(Key::Type)
                .and_then(declared_type_from_token)
                .unwrap_or(field.declared_type),
            declared_size,
            declared_default: parsed.get(Key::Default).map(str::to_string),
            is_primary_key: parsed.has(Flag::PrimaryKey),
            is_auto_increment: parsed.has(Flag::AutoIncrement),
            is_unique: parsed.has(Flag::Unique) || parsed.has(Flag::UniqueIndex),
            is_nullable,
            is_created_at,
            is_updated_at,
            is_deleted_at,
            index_name,
        };

        if is_created_at {
            created_at_seen = Some(column.field_index);
        }
        if is_updated_at {
            updated_at_seen = Some(column.field_index);
        }
        if is_deleted_at {
            deleted_at_seen = Some(column.field_index);
        }

        columns.push(column);
    }

    // Relations: validated but not stored per-column; they live in their
    // own map keyed by field name.
    let mut relations_by_field = HashMap::new();
    for (field, parsed) in M::fields().iter().zip(parsed_per_field.iter()) {
        let Some(parsed) = parsed else { continue };
        let Some(kind_raw) = parsed.get(Key::Relation) else {
            continue;
        };
        let Some(kind) = RelationKind::parse(kind_raw) else {
            errors.push(ParseError::InvalidField {
                field: field.field_name.to_string(),
                reason: format!("unknown relation kind '{kind_raw}'"),
            });
            continue;
        };

        let join_column = parsed.get(Key::JoinColumn).map(str::to_string);
        let join_table = parsed.get(Key::JoinTable).map(str::to_string);
        let mapped_by = parsed.get(Key::MappedBy).map(str::to_string);

        if kind.is_to_one() && mapped_by.is_some() {
            errors.push(ParseError::InvalidField {
                field: field.field_name.to_string(),
                reason: "mappedBy is not valid on an owning (*-to-one) relation side".to_string(),
            });
            continue;
        }
        if kind.is_to_one() && join_table.is_some() {
            errors.push(ParseError::InvalidField {
                field: field.field_name.to_string(),
                reason: "joinTable is not valid on a *-to-one relation side".to_string(),
            });
            continue;
        }
        if kind == RelationKind::ManyToMany && join_table.is_none() && mapped_by.is_none() {
            errors.push(ParseError::InvalidField {
                field: field.field_name.to_string(),
                reason: "many-to-many relations require joinTable or mappedBy".to_string(),
            });
            continue;
        }

        relations_by_field.insert(
            field.field_name.to_string(),
            RelationMetadata {
                field_name: field.field_name.to_string(),
                kind,
                target_type_name: parsed.get(Key::Reference).unwrap_or_default().to_string(),
                join_column,
                join_table,
                mapped_by,
            },
        );
    }

    if !errors.is_empty() {
        return Err(ParseError::aggregate(type_name, errors));
    }

    let primary_key_columns: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_primary_key)
        .map(|(i, _)| i)
        .collect();

    let columns_by_field = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.field_name.clone(), i))
        .collect();
    let columns_by_db_name = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.column_name.clone(), i))
        .collect();

    let created_at_column = columns.iter().position(|c| c.is_created_at);
    let updated_at_column = columns.iter().position(|c| c.is_updated_at);
    let deleted_at_column = columns.iter().position(|c| c.is_deleted_at);

    Ok(EntityMetadata {
        name: type_name.to_string(),
        table_name,
        columns,
        columns_by_field,
        columns_by_db_name,
        primary_key_columns,
        created_at_column,
        updated_at_column,
        deleted_at_column,
        relations_by_field,
    })
}

fn parse_table_annotation(raw: &str) -> Option<String> {
    for token in raw.split(';') {
        if let Some(name) = token.trim().strip_prefix("table:") {
            return Some(name.to_string());
        }
    }
    None
}

fn declared_type_from_token(token: &str) -> Option<DeclaredType> {
    Some(match token {
        "text" | "varchar" | "string" => DeclaredType::Text,
        "integer" | "int" => DeclaredType::Integer,
        "bigint" => DeclaredType::BigInt,
        "real" | "float" | "double" => DeclaredType::Real,
        "boolean" | "bool" => DeclaredType::Boolean,
        "datetime" | "timestamp" => DeclaredType::DateTime,
        "blob" | "bytes" => DeclaredType::Blob,
        "json" => DeclaredType::Json,
        _ => return None,
    })
}
