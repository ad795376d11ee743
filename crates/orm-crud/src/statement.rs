//! SQL statement generation, parametric over a [`Dialect`].

use orm_core::{ColumnMetadata, EntityMetadata, Value};
use orm_dialect::{Dialect, PaginateRequest};

use crate::error::{CrudError, Result};
use crate::options::FindOptions;

/// Resolves the entity's single primary-key column, rejecting composite
/// keys and tables with no primary key at all.
pub(crate) fn single_pk<'a>(meta: &'a EntityMetadata, type_name: &str) -> Result<&'a ColumnMetadata> {
    match meta.primary_key_columns.as_slice() {
        [] => Err(CrudError::MissingPrimaryKey {
            type_name: type_name.to_string(),
        }),
        [_] => Ok(meta.single_primary_key().expect("checked above")),
        _ => Err(CrudError::CompositeKeyUnsupported {
            type_name: type_name.to_string(),
        }),
    }
}

fn column_list(dialect: &dyn Dialect, meta: &EntityMetadata) -> String {
    meta.columns
        .iter()
        .map(|c| dialect.quote(&c.column_name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds `INSERT INTO table (...) VALUES (...)`, omitting an
/// auto-increment primary key whose current value is the zero identity so
/// the backend assigns one.
pub(crate) fn insert_statement(
    dialect: &dyn Dialect,
    meta: &EntityMetadata,
    values: &[Value],
    skip_pk_index: Option<usize>,
) -> (String, Vec<Value>) {
    let mut columns = Vec::with_capacity(meta.columns.len());
    let mut args = Vec::with_capacity(meta.columns.len());
    for (i, column) in meta.columns.iter().enumerate() {
        if Some(i) == skip_pk_index {
            continue;
        }
        columns.push(dialect.quote(&column.column_name));
        args.push(values[i].clone());
    }
    let placeholders = (0..args.len())
        .map(|i| dialect.placeholder(i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote(&meta.table_name),
        columns.join(", "),
        placeholders
    );
    (sql, args)
}

/// Builds `SELECT ... FROM table WHERE pk = ?`, with the soft-delete filter
/// applied when the entity declares a `deletedAt` column.
pub(crate) fn select_by_id_statement(
    dialect: &dyn Dialect,
    meta: &EntityMetadata,
    pk: &ColumnMetadata,
    id: Value,
    include_deleted: bool,
) -> (String, Vec<Value>) {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        column_list(dialect, meta),
        dialect.quote(&meta.table_name),
        dialect.quote(&pk.column_name),
        dialect.placeholder(0)
    );
    if !include_deleted {
        if let Some(deleted) = meta.deleted_at() {
            sql.push_str(&format!(" AND {} IS NULL", dialect.quote(&deleted.column_name)));
        }
    }
    (sql, vec![id])
}

/// Rewrites a filter fragment's single `?` placeholder into `dialect`'s
/// grammar. Rejects fragments with zero or more than one placeholder, since
/// each filter must bind to exactly one value.
fn rewrite_filter_placeholder(
    fragment: &str,
    dialect: &dyn Dialect,
    next_ordinal: usize,
) -> Result<String> {
    if fragment.matches('?').count() != 1 {
        return Err(CrudError::InvalidFilter(fragment.to_string()));
    }
    Ok(fragment.replacen('?', &dialect.placeholder(next_ordinal), 1))
}

/// Builds a `SELECT` statement for [`crate::ops::find`], applying
/// fragment-based filters, soft-delete filtering, `ORDER BY`, and
/// pagination.
pub(crate) fn find_statement(
    dialect: &dyn Dialect,
    meta: &EntityMetadata,
    type_name: &str,
    opts: &FindOptions,
) -> Result<(String, Vec<Value>)> {
    let mut where_clauses = Vec::new();
    let mut args = Vec::new();

    let mut filters: Vec<&(String, Value)> = opts.filters.iter().collect();
    filters.sort_by(|a, b| a.0.cmp(&b.0));
    for (fragment, value) in filters {
        let piece = rewrite_filter_placeholder(fragment, dialect, args.len())?;
        where_clauses.push(piece);
        args.push(value.clone());
    }

    if !opts.include_deleted {
        if let Some(deleted) = meta.deleted_at() {
            where_clauses.push(format!("{} IS NULL", dialect.quote(&deleted.column_name)));
        }
    }

    let mut sql = format!(
        "SELECT {} FROM {}",
        column_list(dialect, meta),
        dialect.quote(&meta.table_name)
    );
    if !where_clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clauses.join(" AND "));
    }

    let mut order_sql = String::new();
    if !opts.order_by.is_empty() {
        let mut parts = Vec::with_capacity(opts.order_by.len());
        for order in &opts.order_by {
            let column = meta.column_by_field(&order.field).ok_or_else(|| {
                CrudError::MissingColumn(format!("{type_name}.{}", order.field))
            })?;
            parts.push(format!(
                "{} {}",
                dialect.quote(&column.column_name),
                if order.ascending { "ASC" } else { "DESC" }
            ));
        }
        order_sql = format!(" ORDER BY {}", parts.join(", "));
    }
    sql.push_str(&order_sql);

    if opts.limit.is_some() || opts.offset.is_some() {
        let single_pk_column = meta.single_primary_key().map(|c| c.column_name.as_str());
        let page = dialect.paginate(PaginateRequest {
            has_order_by: !opts.order_by.is_empty(),
            single_pk_column,
            limit: opts.limit,
            offset: opts.offset,
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

/// Builds `UPDATE table SET ... WHERE pk = ?`, covering every column except
/// the primary key and any `created_at` column -- creation timestamps are
/// immutable once written.
pub(crate) fn update_statement(
    dialect: &dyn Dialect,
    meta: &EntityMetadata,
    pk: &ColumnMetadata,
    values: &[Value],
    pk_value: Value,
) -> (String, Vec<Value>) {
    let mut sets = Vec::with_capacity(meta.columns.len());
    let mut args = Vec::with_capacity(meta.columns.len());
    for (i, column) in meta.columns.iter().enumerate() {
        if column.is_primary_key || column.is_created_at {
            continue;
        }
        sets.push(format!(
            "{} = {}",
            dialect.quote(&column.column_name),
            dialect.placeholder(args.len())
        ));
        args.push(values[i].clone());
    }
    let where_placeholder = dialect.placeholder(args.len());
    args.push(pk_value);
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        dialect.quote(&meta.table_name),
        sets.join(", "),
        dialect.quote(&pk.column_name),
        where_placeholder
    );
    (sql, args)
}

/// Builds the hard-delete statement `DELETE FROM table WHERE pk = ?`.
pub(crate) fn hard_delete_statement(
    dialect: &dyn Dialect,
    meta: &EntityMetadata,
    pk: &ColumnMetadata,
    pk_value: Value,
) -> (String, Vec<Value>) {
    let sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        dialect.quote(&meta.table_name),
        dialect.quote(&pk.column_name),
        dialect.placeholder(0)
    );
    (sql, vec![pk_value])
}

/// Builds the soft-delete statement `UPDATE table SET deleted_at = ? WHERE
/// pk = ? AND deleted_at IS NULL`, used when the entity declares a
/// `deletedAt` column. The `deleted_at IS NULL` guard makes a repeated
/// delete on an already-deleted row affect zero rows instead of
/// re-stamping it.
pub(crate) fn soft_delete_statement(
    dialect: &dyn Dialect,
    meta: &EntityMetadata,
    pk: &ColumnMetadata,
    deleted_at: &ColumnMetadata,
    now: Value,
    pk_value: Value,
) -> (String, Vec<Value>) {
    let sql = format!(
        "UPDATE {} SET {} = {} WHERE {} = {} AND {} IS NULL",
        dialect.quote(&meta.table_name),
        dialect.quote(&deleted_at.column_name),
        dialect.placeholder(0),
        dialect.quote(&pk.column_name),
        dialect.placeholder(1),
        dialect.quote(&deleted_at.column_name)
    );
    (sql, vec![now, pk_value])
}
