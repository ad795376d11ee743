//! Scans a [`Row`] into a `Model` instance, driven by column metadata
//! rather than positional order, so column order in the backend's result
//! set never has to match `Model::fields()` order.

use orm_connect::Row;
use orm_core::{EntityMetadata, Model};

use crate::error::Result;

/// Exposed beyond this crate so `orm-query` can scan result rows the same
/// way the CRUD engine does, instead of duplicating the metadata-driven
/// column-to-setter mapping.
pub fn scan_row<M: Model + Default>(meta: &EntityMetadata, row: &dyn Row) -> Result<M> {
    let mut instance = M::default();
    let fields = M::fields();
    for column in &meta.columns {
        let value = row.value_by_name(&column.column_name)?;
        let descriptor = &fields[column.field_index];
        (descriptor.set)(&mut instance, value)?;
    }
    Ok(instance)
}
