//! The CRUD engine: Insert/FindByID/Find/Update/Delete, dialect-
//! routed through a [`orm_connect::DataSource`].

pub mod error;
mod ops;
pub mod options;
pub mod scan;
mod statement;

pub use error::CrudError;
pub use ops::{delete, find, find_by_id, insert, update};
pub use options::{FindOptions, OrderBy};
pub use scan::scan_row;

#[cfg(test)]
mod tests {
    use super::*;
    use orm_connect::{DataSource, OpContext, SqliteDataSource};
    use orm_core::{DeclaredType, FieldDescriptor, FieldError, Model, Value};
    use std::sync::OnceLock;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Widget {
        id: i64,
        name: String,
        price: f64,
        archived_at: Option<chrono::DateTime<chrono::Utc>>,
    }

    fn widget_fields() -> &'static [FieldDescriptor<Widget>] {
        static FIELDS: OnceLock<Vec<FieldDescriptor<Widget>>> = OnceLock::new();
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
                    annotation: "notnull",
                    declared_type: DeclaredType::Text,
                    rust_option: false,
                    get: |m: &Widget| Value::Text(m.name.clone()),
                    set: |m: &mut Widget, v: Value| {
                        m.name = v.as_text().unwrap_or_default().to_string();
                        Ok(())
                    },
                },
                FieldDescriptor {
                    field_index: 2,
                    field_name: "price",
                    annotation: "",
                    declared_type: DeclaredType::Real,
                    rust_option: false,
                    get: |m: &Widget| Value::F64(m.price),
                    set: |m: &mut Widget, v: Value| {
                        m.price = match v {
                            Value::F64(f) => f,
                            Value::I64(i) => i as f64,
                            _ => 0.0,
                        };
                        Ok(())
                    },
                },
                FieldDescriptor {
                    field_index: 3,
                    field_name: "archived_at",
                    annotation: "deletedAt",
                    declared_type: DeclaredType::DateTime,
                    rust_option: true,
                    get: |m: &Widget| match m.archived_at {
                        Some(dt) => Value::DateTime(dt),
                        None => Value::Null,
                    },
                    set: |m: &mut Widget, v: Value| {
                        m.archived_at = match v {
                            Value::DateTime(dt) => Some(dt),
                            Value::Null => None,
                            _ => None,
                        };
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

    fn setup() -> SqliteDataSource {
        let ds = SqliteDataSource::open_in_memory().unwrap();
        let ctx = OpContext::background();
        ds.execute(
            &ctx,
            "CREATE TABLE widgets (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, price REAL, archived_at TEXT)",
            &[],
        )
        .unwrap();
        ds
    }

    #[test]
    fn insert_assigns_identity() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        let mut w = Widget {
            id: 0,
            name: "gizmo".into(),
            price: 9.99,
            archived_at: None,
        };
        insert(&ds, &ctx, &mut w).unwrap();
        assert_eq!(w.id, 1);
    }

    #[test]
    fn find_by_id_round_trips() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        let mut w = Widget {
            id: 0,
            name: "sprocket".into(),
            price: 1.5,
            archived_at: None,
        };
        insert(&ds, &ctx, &mut w).unwrap();

        let found: Widget = find_by_id(&ds, &ctx, w.id, false).unwrap().unwrap();
        assert_eq!(found.name, "sprocket");
        assert_eq!(found.price, 1.5);
    }

    #[test]
    fn soft_deleted_rows_are_excluded_by_default() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        let mut w = Widget {
            id: 0,
            name: "cog".into(),
            price: 3.0,
            archived_at: None,
        };
        insert(&ds, &ctx, &mut w).unwrap();
        delete(&ds, &ctx, &w).unwrap();

        let visible: Option<Widget> = find_by_id(&ds, &ctx, w.id, false).unwrap();
        assert!(visible.is_none());
        let including_deleted: Option<Widget> = find_by_id(&ds, &ctx, w.id, true).unwrap();
        assert!(including_deleted.is_some());
    }

    #[test]
    fn update_requires_non_zero_identity() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        let mut w = Widget {
            id: 0,
            name: "unsaved".into(),
            price: 0.0,
            archived_at: None,
        };
        let err = update(&ds, &ctx, &mut w).unwrap_err();
        assert!(matches!(err, CrudError::ZeroIdentity { .. }));
    }

    #[test]
    fn update_persists_changes() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        let mut w = Widget {
            id: 0,
            name: "widget".into(),
            price: 1.0,
            archived_at: None,
        };
        insert(&ds, &ctx, &mut w).unwrap();

        w.price = 42.0;
        update(&ds, &ctx, &mut w).unwrap();

        let found: Widget = find_by_id(&ds, &ctx, w.id, false).unwrap().unwrap();
        assert_eq!(found.price, 42.0);
    }

    #[test]
    fn find_applies_filters_and_order() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        for (name, price) in [("a", 3.0), ("b", 1.0), ("c", 2.0)] {
            let mut w = Widget {
                id: 0,
                name: name.into(),
                price,
                archived_at: None,
            };
            insert(&ds, &ctx, &mut w).unwrap();
        }

        let results: Vec<Widget> = find(
            &ds,
            &ctx,
            &FindOptions::new().order_by(OrderBy::asc("price")),
        )
        .unwrap();
        let names: Vec<_> = results.iter().map(|w| w.name.clone()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn find_filter_fragment_is_bound_and_and_joined() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        for (name, price) in [("a", 3.0), ("b", 1.0), ("c", 2.0)] {
            let mut w = Widget {
                id: 0,
                name: name.into(),
                price,
                archived_at: None,
            };
            insert(&ds, &ctx, &mut w).unwrap();
        }

        let results: Vec<Widget> = find(
            &ds,
            &ctx,
            &FindOptions::new()
                .filter("price > ?", 1.5)
                .order_by(OrderBy::asc("price")),
        )
        .unwrap();
        let names: Vec<_> = results.iter().map(|w| w.name.clone()).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn find_rejects_a_filter_fragment_with_no_placeholder() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();

        let err = find::<Widget>(&ds, &ctx, &FindOptions::new().filter("price > 1", 1.5)).unwrap_err();
        assert!(matches!(err, CrudError::InvalidFilter(_)));
    }

    #[test]
    fn update_leaves_created_at_untouched() {
        orm_core::clear();
        let ds = SqliteDataSource::open_in_memory().unwrap();
        let ctx = OpContext::background();
        ds.execute(
            &ctx,
            "CREATE TABLE stamped (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, created_at TEXT)",
            &[],
        )
        .unwrap();

        #[derive(Debug, Default, Clone, PartialEq)]
        struct Stamped {
            id: i64,
            name: String,
            created_at: Option<chrono::DateTime<chrono::Utc>>,
        }

        fn stamped_fields() -> &'static [FieldDescriptor<Stamped>] {
            static FIELDS: OnceLock<Vec<FieldDescriptor<Stamped>>> = OnceLock::new();
            FIELDS.get_or_init(|| {
                vec![
                    FieldDescriptor {
                        field_index: 0,
                        field_name: "id",
                        annotation: "primaryKey;autoIncrement",
                        declared_type: DeclaredType::BigInt,
                        rust_option: false,
                        get: |m: &Stamped| Value::I64(m.id),
                        set: |m: &mut Stamped, v: Value| {
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
                        annotation: "notnull",
                        declared_type: DeclaredType::Text,
                        rust_option: false,
                        get: |m: &Stamped| Value::Text(m.name.clone()),
                        set: |m: &mut Stamped, v: Value| {
                            m.name = v.as_text().unwrap_or_default().to_string();
                            Ok(())
                        },
                    },
                    FieldDescriptor {
                        field_index: 2,
                        field_name: "created_at",
                        annotation: "createdAt",
                        declared_type: DeclaredType::DateTime,
                        rust_option: true,
                        get: |m: &Stamped| match m.created_at {
                            Some(dt) => Value::DateTime(dt),
                            None => Value::Null,
                        },
                        set: |m: &mut Stamped, v: Value| {
                            m.created_at = match v {
                                Value::DateTime(dt) => Some(dt),
                                _ => None,
                            };
                            Ok(())
                        },
                    },
                ]
            })
        }

        impl Model for Stamped {
            fn type_name() -> &'static str {
                "Stamped"
            }
            fn fields() -> &'static [FieldDescriptor<Self>] {
                stamped_fields()
            }
        }

        let mut s = Stamped {
            id: 0,
            name: "first".into(),
            created_at: None,
        };
        insert(&ds, &ctx, &mut s).unwrap();
        let original_created_at = s.created_at;

        s.name = "renamed".into();
        s.created_at = Some(chrono::Utc::now() + chrono::Duration::days(365));
        update(&ds, &ctx, &mut s).unwrap();

        let found: Stamped = find_by_id(&ds, &ctx, s.id, false).unwrap().unwrap();
        assert_eq!(found.name, "renamed");
        assert_eq!(found.created_at, original_created_at);
    }

    #[test]
    fn update_on_a_vanished_row_is_not_found() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        let mut w = Widget {
            id: 0,
            name: "ghost".into(),
            price: 1.0,
            archived_at: None,
        };
        insert(&ds, &ctx, &mut w).unwrap();
        ds.execute(&ctx, "DELETE FROM widgets WHERE id = ?", &[Value::I64(w.id)])
            .unwrap();

        let err = update(&ds, &ctx, &mut w).unwrap_err();
        assert!(matches!(err, CrudError::NotFound { .. }));
    }

    #[test]
    fn deleting_an_already_deleted_row_is_not_found() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        let mut w = Widget {
            id: 0,
            name: "cog".into(),
            price: 3.0,
            archived_at: None,
        };
        insert(&ds, &ctx, &mut w).unwrap();
        delete(&ds, &ctx, &w).unwrap();

        let err = delete(&ds, &ctx, &w).unwrap_err();
        assert!(matches!(err, CrudError::NotFound { .. }));
    }
}
