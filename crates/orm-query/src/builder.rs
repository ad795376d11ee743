//! [`QueryBuilder`]: a fluent `SELECT` accumulator with deferred error
//! surfacing.

use std::marker::PhantomData;

use orm_connect::{DataSource, OpContext};
use orm_core::{EntityMetadata, Model, Value};
use orm_dialect::PaginateRequest;

use crate::error::{QueryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

struct Condition {
    fragment: String,
    args: Vec<Value>,
    connector: Connector,
}

/// Fluent accumulator for a single `SELECT` statement. Every builder method
/// after an error has been recorded is a no-op that returns `self`
/// unchanged; the error surfaces when [`build`],
/// [`get_one`], or [`get_many`] finally runs.
///
/// [`build`]: QueryBuilder::build
/// [`get_one`]: QueryBuilder::get_one
/// [`get_many`]: QueryBuilder::get_many
pub struct QueryBuilder<M> {
    select_fields: Vec<String>,
    conditions: Vec<Condition>,
    order_by: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    preload: Vec<String>,
    error: Option<QueryError>,
    _model: PhantomData<M>,
}

impl<M: Model> Default for QueryBuilder<M> {
    fn default() -> Self {
        QueryBuilder {
            select_fields: Vec::new(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            preload: Vec::new(),
            error: None,
            _model: PhantomData,
        }
    }
}

impl<M: Model> QueryBuilder<M> {
    /// Starts a query against `M`. Rust's generics identify the target
    /// type without needing a live instance to derive it from.
    pub fn model() -> Self {
        Self::default()
    }

    fn errored(&self) -> bool {
        self.error.is_some()
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        if self.errored() {
            return self;
        }
        self.select_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Adds an `AND`-joined condition. `fragment` may contain `?`
    /// placeholders which are rewritten to the target dialect's grammar at
    /// [`build`](Self::build) time.
    pub fn where_(mut self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        if self.errored() {
            return self;
        }
        self.conditions.push(Condition {
            fragment: fragment.into(),
            args,
            connector: Connector::And,
        });
        self
    }

    /// Adds an `OR`-joined condition.
    pub fn or_where(mut self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        if self.errored() {
            return self;
        }
        self.conditions.push(Condition {
            fragment: fragment.into(),
            args,
            connector: Connector::Or,
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        if self.errored() {
            return self;
        }
        self.order_by.push((field.into(), direction));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        if self.errored() {
            return self;
        }
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        if self.errored() {
            return self;
        }
        self.offset = Some(n);
        self
    }

    /// Records relations to preload. Nested (dotted) paths are rejected
    /// immediately -- the core does not emit joins in this version.
    pub fn preload(mut self, relations: &[&str]) -> Self {
        if self.errored() {
            return self;
        }
        for relation in relations {
            if relation.contains('.') {
                self.error = Some(QueryError::NestedPreloadRejected(relation.to_string()));
                return self;
            }
            self.preload.push(relation.to_string());
        }
        self
    }

    /// Relations recorded via [`preload`](Self::preload). The core does not
    /// yet emit joins for these; callers hydrate them separately.
    pub fn preloaded(&self) -> &[String] {
        &self.preload
    }

    /// Renders the accumulated state into `(sql, args)` for `meta`'s table,
    /// using `dialect`'s placeholder, quoting, and pagination grammar.
    pub fn build(
        mut self,
        meta: &EntityMetadata,
        dialect: &dyn orm_dialect::Dialect,
    ) -> Result<(String, Vec<Value>)> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        let select_sql = if self.select_fields.is_empty() {
            meta.columns
                .iter()
                .map(|c| format!("{}.{}", dialect.quote(&meta.table_name), dialect.quote(&c.column_name)))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            let mut parts = Vec::with_capacity(self.select_fields.len());
            for field in &self.select_fields {
                let column = meta
                    .column_by_field(field)
                    .ok_or_else(|| QueryError::UnknownField(field.clone()))?;
                parts.push(format!(
                    "{}.{}",
                    dialect.quote(&meta.table_name),
                    dialect.quote(&column.column_name)
                ));
            }
            parts.join(", ")
        };

        let mut sql = format!(
            "SELECT {} FROM {}",
            select_sql,
            dialect.quote(&meta.table_name)
        );

        let mut args = Vec::new();
        if !self.conditions.is_empty() {
            let mut rendered = Vec::with_capacity(self.conditions.len());
            for (i, condition) in self.conditions.iter().enumerate() {
                let piece = rewrite_placeholders(&condition.fragment, dialect, &mut args, &condition.args);
                if i == 0 {
                    rendered.push(format!("({piece})"));
                } else {
                    let connector = match condition.connector {
                        Connector::And => "AND",
                        Connector::Or => "OR",
                    };
                    rendered.push(format!("{connector} ({piece})"));
                }
            }
            sql.push_str(" WHERE ");
            sql.push_str(&rendered.join(" "));
        }

        if !self.order_by.is_empty() {
            let mut parts = Vec::with_capacity(self.order_by.len());
            for (field, direction) in &self.order_by {
                let column = meta
                    .column_by_field(field)
                    .ok_or_else(|| QueryError::UnknownField(field.clone()))?;
                let dir = match direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                parts.push(format!("{} {}", dialect.quote(&column.column_name), dir));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        if self.limit.is_some() || self.offset.is_some() {
            let single_pk_column = meta.single_primary_key().map(|c| c.column_name.as_str());
            let page = dialect.paginate(PaginateRequest {
                has_order_by: !self.order_by.is_empty(),
                single_pk_column,
                limit: self.limit,
                offset: self.offset,
                next_ordinal: args.len(),
            })?;
            if let Some(synthesized) = page.synthesized_order_by {
                sql.push(' ');
                sql.push_str(&synthesized);
            }
            sql.push(' ');
            sql.push_str(&page.clause_sql);
            args.extend(page.extra_args);
        }

        Ok((sql, args))
    }

    pub fn get_one(self, ds: &dyn DataSource, ctx: &OpContext) -> Result<Option<M>>
    where
        M: Default,
    {
        let meta = orm_core::parse::<M>()?;
        let dialect = ds.dialect();
        let (sql, args) = self.build(&meta, dialect)?;

        let mut found: Option<M> = None;
        let mut scan_err = None;
        ds.query(ctx, &sql, &args, &mut |row| {
            if found.is_none() {
                match orm_crud::scan_row(&meta, row) {
                    Ok(m) => found = Some(m),
                    Err(e) => scan_err = Some(e),
                }
            }
            Ok(())
        })?;
        if let Some(e) = scan_err {
            return Err(e.into());
        }
        Ok(found)
    }

    pub fn get_many(self, ds: &dyn DataSource, ctx: &OpContext) -> Result<Vec<M>>
    where
        M: Default,
    {
        let meta = orm_core::parse::<M>()?;
        let dialect = ds.dialect();
        let (sql, args) = self.build(&meta, dialect)?;

        let mut rows = Vec::new();
        let mut scan_err = None;
        ds.query(ctx, &sql, &args, &mut |row| {
            match orm_crud::scan_row(&meta, row) {
                Ok(m) => rows.push(m),
                Err(e) => scan_err = Some(e),
            }
            Ok(())
        })?;
        if let Some(e) = scan_err {
            return Err(e.into());
        }
        Ok(rows)
    }
}

/// Rewrites the neutral `?` placeholder tokens in a where-fragment into
/// `dialect`'s grammar, appending matching args to `out_args` in order.
fn rewrite_placeholders(
    fragment: &str,
    dialect: &dyn orm_dialect::Dialect,
    out_args: &mut Vec<Value>,
    condition_args: &[Value],
) -> String {
    let mut rendered = String::with_capacity(fragment.len());
    let mut arg_iter = condition_args.iter();
    for ch in fragment.chars() {
        if ch == '?' {
            if let Some(value) = arg_iter.next() {
                rendered.push_str(&dialect.placeholder(out_args.len()));
                out_args.push(value.clone());
                continue;
            }
        }
        rendered.push(ch);
    }
    rendered
}
