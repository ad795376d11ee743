//! Fluent query builder: a single-`SELECT` accumulator with
//! deferred error surfacing, reusing `orm-crud`'s row scanning.

mod builder;
pub mod error;

pub use builder::{Connector, Direction, QueryBuilder};
pub use error::QueryError;

#[cfg(test)]
mod tests {
    use super::*;
    use orm_connect::{DataSource, OpContext, SqliteDataSource};
    use orm_core::{DeclaredType, FieldDescriptor, FieldError, Model, Value};
    use std::sync::OnceLock;

    #[derive(Debug, Default, Clone)]
    struct Product {
        id: i64,
        name: String,
        price: f64,
    }

    fn product_fields() -> &'static [FieldDescriptor<Product>] {
        static FIELDS: OnceLock<Vec<FieldDescriptor<Product>>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            vec![
                FieldDescriptor {
                    field_index: 0,
                    field_name: "id",
                    annotation: "primaryKey;autoIncrement",
                    declared_type: DeclaredType::BigInt,
                    rust_option: false,
                    get: |m: &Product| Value::I64(m.id),
                    set: |m: &mut Product, v: Value| {
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
                    get: |m: &Product| Value::Text(m.name.clone()),
                    set: |m: &mut Product, v: Value| {
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
                    get: |m: &Product| Value::F64(m.price),
                    set: |m: &mut Product, v: Value| {
                        m.price = match v {
                            Value::F64(f) => f,
                            Value::I64(i) => i as f64,
                            _ => 0.0,
                        };
                        Ok(())
                    },
                },
            ]
        })
    }

    impl Model for Product {
        fn type_name() -> &'static str {
            "Product"
        }
        fn fields() -> &'static [FieldDescriptor<Self>] {
            product_fields()
        }
    }

    fn setup() -> SqliteDataSource {
        let ds = SqliteDataSource::open_in_memory().unwrap();
        let ctx = OpContext::background();
        ds.execute(
            &ctx,
            "CREATE TABLE products (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, price REAL)",
            &[],
        )
        .unwrap();
        let mut product = Product {
            id: 0,
            name: "placeholder".into(),
            price: 0.0,
        };
        orm_crud::insert(&ds, &ctx, &mut product).unwrap();
        ds
    }

    #[test]
    fn deferred_error_short_circuits_build() {
        orm_core::clear();
        let builder = QueryBuilder::<Product>::model().preload(&["a.b"]);
        let meta = orm_core::parse::<Product>().unwrap();
        let err = builder
            .build(&meta, orm_dialect::dialect_for(orm_dialect::DriverTag::Sqlite).unwrap())
            .unwrap_err();
        assert!(matches!(err, QueryError::NestedPreloadRejected(_)));
    }

    #[test]
    fn where_and_or_where_combine_with_parens() {
        orm_core::clear();
        let meta = orm_core::parse::<Product>().unwrap();
        let dialect = orm_dialect::dialect_for(orm_dialect::DriverTag::Postgres).unwrap();
        let (sql, args) = QueryBuilder::<Product>::model()
            .where_("price > ?", vec![Value::F64(1.0)])
            .or_where("name = ?", vec![Value::Text("x".into())])
            .build(&meta, dialect)
            .unwrap();
        assert!(sql.contains("WHERE (price > $1) OR (name = $2)"));
        assert_eq!(args, vec![Value::F64(1.0), Value::Text("x".into())]);
    }

    #[test]
    fn get_many_round_trips_against_sqlite() {
        orm_core::clear();
        let ds = setup();
        let ctx = OpContext::background();
        let results = QueryBuilder::<Product>::model()
            .order_by("name", Direction::Asc)
            .get_many(&ds, &ctx)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "placeholder");
    }
}
