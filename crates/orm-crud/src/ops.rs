//! Insert/FindByID/Find/Update/Delete, dialect-routed through a
//! [`DataSource`].

use chrono::Utc;
use orm_connect::{DataSource, OpContext};
use orm_core::{DeclaredType, Model, Value};

use crate::error::{CrudError, Result};
use crate::options::FindOptions;
use crate::scan::scan_row;
use crate::statement::{
    find_statement, hard_delete_statement, insert_statement, select_by_id_statement,
    single_pk, soft_delete_statement, update_statement,
};

fn field_values<M: Model>(instance: &M) -> Vec<Value> {
    M::fields().iter().map(|f| (f.get)(instance)).collect()
}

/// Inserts `instance`, stamping `createdAt`/`updatedAt` columns and writing
/// an auto-increment identity back onto the instance when the backend
/// reports one. A returned identity that overflows a 32-bit `Integer`
/// primary key is a [`CrudError::IdentityOverflow`], not a silent
/// truncation.
pub fn insert<M: Model>(ds: &dyn DataSource, ctx: &OpContext, instance: &mut M) -> Result<()> {
    let meta = orm_core::parse::<M>()?;
    let pk = single_pk(&meta, M::type_name())?;
    let pk_field_index = pk.field_index;

    let now = Utc::now();
    if let Some(created) = meta.created_at() {
        (M::fields()[created.field_index].set)(instance, Value::DateTime(now))?;
    }
    if let Some(updated) = meta.updated_at() {
        (M::fields()[updated.field_index].set)(instance, Value::DateTime(now))?;
    }

    let values = field_values(instance);
    let skip_pk = if pk.is_auto_increment && values[pk_field_index].is_zero_identity() {
        Some(pk_field_index)
    } else {
        None
    };

    let (sql, args) = insert_statement(ds.dialect(), &meta, &values, skip_pk);
    let result = ds.execute(ctx, &sql, &args)?;

    if skip_pk.is_some() && ds.dialect().supports_last_inserted_id() {
        if let Some(id) = result.last_insert_id {
            if pk.declared_type == DeclaredType::Integer && i32::try_from(id).is_err() {
                return Err(CrudError::IdentityOverflow {
                    type_name: M::type_name().to_string(),
                    value: id,
                });
            }
            (M::fields()[pk_field_index].set)(instance, Value::I64(id))?;
        }
    }
    Ok(())
}

/// Looks up a single row by primary key, honoring soft-delete filtering
/// unless `include_deleted` is requested.
pub fn find_by_id<M: Model + Default>(
    ds: &dyn DataSource,
    ctx: &OpContext,
    id: impl Into<Value>,
    include_deleted: bool,
) -> Result<Option<M>> {
    let meta = orm_core::parse::<M>()?;
    let pk = single_pk(&meta, M::type_name())?;
    let (sql, args) = select_by_id_statement(ds.dialect(), &meta, pk, id.into(), include_deleted);

    let mut found: Option<M> = None;
    let mut scan_err = None;
    ds.query(ctx, &sql, &args, &mut |row| {
        match scan_row(&meta, row) {
            Ok(m) => found = Some(m),
            Err(e) => scan_err = Some(e),
        }
        Ok(())
    })?;
    if let Some(e) = scan_err {
        return Err(e);
    }
    Ok(found)
}

/// Finds every row matching `opts`.
pub fn find<M: Model + Default>(
    ds: &dyn DataSource,
    ctx: &OpContext,
    opts: &FindOptions,
) -> Result<Vec<M>> {
    let meta = orm_core::parse::<M>()?;
    let (sql, args) = find_statement(ds.dialect(), &meta, M::type_name(), opts)?;

    let mut rows = Vec::new();
    let mut scan_err = None;
    ds.query(ctx, &sql, &args, &mut |row| {
        match scan_row(&meta, row) {
            Ok(m) => rows.push(m),
            Err(e) => scan_err = Some(e),
        }
        Ok(())
    })?;
    if let Some(e) = scan_err {
        return Err(e);
    }
    Ok(rows)
}

/// Updates every column except the primary key and any `createdAt` column
/// from `instance`'s current field values, stamping `updatedAt` if
/// declared. Requires a non-zero primary key value, and fails with
/// [`CrudError::NotFound`]/[`CrudError::Integrity`] if the statement
/// affects anything other than exactly one row.
pub fn update<M: Model>(ds: &dyn DataSource, ctx: &OpContext, instance: &mut M) -> Result<()> {
    let meta = orm_core::parse::<M>()?;
    let pk = single_pk(&meta, M::type_name())?;

    let pk_value = (M::fields()[pk.field_index].get)(instance);
    if pk_value.is_zero_identity() {
        return Err(CrudError::ZeroIdentity {
            type_name: M::type_name().to_string(),
        });
    }

    if let Some(updated) = meta.updated_at() {
        (M::fields()[updated.field_index].set)(instance, Value::DateTime(Utc::now()))?;
    }

    let values = field_values(instance);
    let (sql, args) = update_statement(ds.dialect(), &meta, pk, &values, pk_value);
    let result = ds.execute(ctx, &sql, &args)?;
    check_single_row_affected::<M>(result.rows_affected)?;
    Ok(())
}

/// Deletes `instance` by primary key. Soft-deletes (stamping `deletedAt`,
/// guarded so an already-deleted row is not re-stamped) when the entity
/// declares that column, otherwise removes the row. Fails with
/// [`CrudError::NotFound`] if the row is already gone (or already
/// soft-deleted) and [`CrudError::Integrity`] if more than one row was
/// affected.
pub fn delete<M: Model>(ds: &dyn DataSource, ctx: &OpContext, instance: &M) -> Result<()> {
    let meta = orm_core::parse::<M>()?;
    let pk = single_pk(&meta, M::type_name())?;

    let pk_value = (M::fields()[pk.field_index].get)(instance);
    if pk_value.is_zero_identity() {
        return Err(CrudError::ZeroIdentity {
            type_name: M::type_name().to_string(),
        });
    }

    let (sql, args) = if let Some(deleted) = meta.deleted_at() {
        soft_delete_statement(ds.dialect(), &meta, pk, deleted, Value::DateTime(Utc::now()), pk_value)
    } else {
        hard_delete_statement(ds.dialect(), &meta, pk, pk_value)
    };
    let result = ds.execute(ctx, &sql, &args)?;
    check_single_row_affected::<M>(result.rows_affected)?;
    Ok(())
}

/// Shared Update/Delete postcondition: the statement must have touched
/// exactly one row. Zero means the primary key matched nothing (or, for a
/// soft delete, the row was already deleted); more than one means the
/// primary key isn't actually unique in the backend.
fn check_single_row_affected<M: Model>(rows_affected: u64) -> Result<()> {
    match rows_affected {
        1 => Ok(()),
        0 => Err(CrudError::NotFound {
            type_name: M::type_name().to_string(),
        }),
        rows => Err(CrudError::Integrity {
            type_name: M::type_name().to_string(),
            rows,
        }),
    }
}
