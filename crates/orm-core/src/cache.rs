//! Process-wide, concurrency-safe metadata cache.
//!
//! Multiple readers proceed without contention; a cache miss briefly
//! excludes other parses for the *same* lookup via the `RwLock` write path,
//! then inserts the freshly built metadata so subsequent lookups are
//! reference-equal `Arc` clones.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::ParseError;
use crate::metadata::{self, EntityMetadata};
use crate::model::Model;

type CacheMap = HashMap<TypeId, Arc<EntityMetadata>>;

fn cache() -> &'static RwLock<CacheMap> {
    static CACHE: OnceLock<RwLock<CacheMap>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Parses `M`'s metadata, or returns the cached result from a prior parse.
///
/// On error, nothing is inserted into the cache, so a subsequent call
/// (e.g. after fixing an annotation bug and recompiling in a dev loop) will
/// retry the parse.
pub fn parse<M: Model>() -> Result<Arc<EntityMetadata>, ParseError> {
    let type_id = M::type_id();

    if let Some(hit) = cache().read().expect("metadata cache poisoned").get(&type_id) {
        return Ok(Arc::clone(hit));
    }

    let built = Arc::new(metadata::build::<M>()?);

    let mut guard = cache().write().expect("metadata cache poisoned");
    // Another thread may have raced us to the write lock; prefer whichever
    // entry is already present so every caller observes the same `Arc`.
    let entry = guard.entry(type_id).or_insert_with(|| Arc::clone(&built));
    Ok(Arc::clone(entry))
}

/// Convenience wrapper taking a live instance instead of a type parameter;
/// the instance's value is not inspected, only its type.
pub fn parse_instance<M: Model>(_instance: &M) -> Result<Arc<EntityMetadata>, ParseError> {
    parse::<M>()
}

/// Clears every cached entry. Test scaffolding only — production code
/// should never need to invalidate metadata mid-process.
pub fn clear() {
    cache().write().expect("metadata cache poisoned").clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;
    use crate::model::{DeclaredType, FieldDescriptor};
    use crate::value::Value;

    struct Widget {
        id: i64,
        name: String,
    }

    fn widget_fields() -> &'static [FieldDescriptor<Widget>] {
        static FIELDS: std::sync::OnceLock<Vec<FieldDescriptor<Widget>>> = std::sync::OnceLock::new();
        FIELDS.get_or_init(|| {
            vec![
                FieldDescriptor {
                    field_index: 0,
                    field_name: "id",
                    annotation: "primaryKey;autoIncrement",
                    declared_type: DeclaredType::BigInt,
                    rust_option: false,
                    get: |m: &Widget| Value::I64(m.id),
                    set: |m: &mut Widget, v: Value| {
                        m.id = v.as_i64().ok_or_else(|| FieldError {
                            field: "id".into(),
                            reason: "expected integer".into(),
                        })?;
                        Ok(())
                    },
                },
                FieldDescriptor {
                    field_index: 1,
                    field_name: "name",
                    annotation: "notnull;unique",
                    declared_type: DeclaredType::Text,
                    rust_option: false,
                    get: |m: &Widget| Value::Text(m.name.clone()),
                    set: |m: &mut Widget, v: Value| {
                        m.name = v.as_text().unwrap_or_default().to_string();
                        Ok(())
                    },
                },
            ]
        })
    }

    impl Model for Widget {
        fn type_name() -> &'static str {
            "Widget"
        }
        fn fields() -> &'static [FieldDescriptor<Self>] {
            widget_fields()
        }
    }

    #[test]
    fn parse_is_reference_equal_across_calls() {
        clear();
        let a = parse::<Widget>().unwrap();
        let b = parse::<Widget>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn default_table_name_is_pluralized_snake_case() {
        clear();
        let m = parse::<Widget>().unwrap();
        assert_eq!(m.table_name, "widgets");
    }

    #[test]
    fn columns_by_name_maps_agree() {
        clear();
        let m = parse::<Widget>().unwrap();
        for c in &m.columns {
            assert_eq!(m.column_by_field(&c.field_name), Some(c));
            assert_eq!(m.column_by_db_name(&c.column_name), Some(c));
        }
    }
}
