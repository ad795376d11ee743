//! [`FindOptions`]: the parameters accepted by [`crate::ops::find`].

use orm_core::Value;

/// One `ORDER BY` entry, addressed by field name (translated to the
/// column name during statement generation).
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            ascending: false,
        }
    }
}

/// Options accepted by [`crate::ops::find`]. Filters are `(fragment, value)`
/// pairs -- a SQL fragment containing exactly one `?` placeholder, AND-joined
/// in lexicographic order of the fragment text. OR groups and joins belong to
/// the query builder in `orm-query`, not here.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub filters: Vec<(String, Value)>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// When `false` (the default), rows with a non-null soft-delete column
    /// are excluded. Ignored for entities with no `deletedAt` column.
    pub include_deleted: bool,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter. `fragment` is a SQL condition containing exactly one
    /// `?` placeholder, e.g. `"price > ?"` or `"name LIKE ?"` -- plain
    /// equality is just `"name = ?"`. Invalid fragments are rejected when
    /// the statement is built, not here.
    pub fn filter(mut self, fragment: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((fragment.into(), value.into()));
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }
}
