//! Backend-facing contracts: [`DataSource`], [`Transaction`], [`Row`],
//! and the document-store collaborator interface.

use orm_core::Value;
use orm_dialect::{Dialect, DriverTag};

use crate::context::OpContext;
use crate::error::Result;

/// The result of an `execute` call against a relational backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Populated only when the dialect supports identity retrieval
    /// ([`Dialect::supports_last_inserted_id`]) and the statement was an
    /// insert against an auto-increment column.
    pub last_insert_id: Option<i64>,
}

/// One row of a query result, addressed by ordinal or column name.
///
/// `orm-crud`'s row-scanning helpers are the only consumers; dialects never
/// see a `Row` directly.
pub trait Row {
    fn column_count(&self) -> usize;
    fn value_at(&self, index: usize) -> Result<Value>;
    fn value_by_name(&self, name: &str) -> Result<Value>;
}

/// A relational backend connection. One instance per logical database;
/// internal synchronization (e.g. a `Mutex`-guarded connection, as
/// `SqliteDataSource` uses) is the implementation's responsibility.
pub trait DataSource: Send + Sync {
    fn driver_tag(&self) -> DriverTag;

    fn dialect(&self) -> &dyn Dialect;

    /// Runs a statement with no result set (INSERT/UPDATE/DELETE/DDL).
    fn execute(&self, ctx: &OpContext, sql: &str, args: &[Value]) -> Result<ExecResult>;

    /// Runs a statement with a result set, invoking `visit` once per row.
    fn query(
        &self,
        ctx: &OpContext,
        sql: &str,
        args: &[Value],
        visit: &mut dyn FnMut(&dyn Row) -> Result<()>,
    ) -> Result<()>;

    /// Begins a transaction. The returned handle commits on
    /// [`Transaction::commit`] and rolls back on drop if not committed.
    fn begin<'a>(&'a self, ctx: &OpContext) -> Result<Box<dyn Transaction + 'a>>;
}

/// A started transaction. Offers the same statement surface as
/// [`DataSource`] so CRUD/migration code can be generic over both.
pub trait Transaction {
    fn execute(&self, ctx: &OpContext, sql: &str, args: &[Value]) -> Result<ExecResult>;

    fn query(
        &self,
        ctx: &OpContext,
        sql: &str,
        args: &[Value],
        visit: &mut dyn FnMut(&dyn Row) -> Result<()>,
    ) -> Result<()>;

    fn commit(self: Box<Self>) -> Result<()>;

    fn rollback(self: Box<Self>) -> Result<()>;
}

/// Document-store collaborator interface for the MongoDB driver tag. No concrete implementation ships in this workspace; the interface
/// exists so `orm-crud`/registries can be generic over relational and
/// document backends without a MongoDB dependency.
pub trait DocumentStore: Send + Sync {
    fn insert_one(&self, ctx: &OpContext, collection: &str, document: &str) -> Result<String>;

    fn find_by_id(&self, ctx: &OpContext, collection: &str, id: &str) -> Result<Option<String>>;

    fn update_by_id(&self, ctx: &OpContext, collection: &str, id: &str, document: &str) -> Result<bool>;

    fn delete_by_id(&self, ctx: &OpContext, collection: &str, id: &str) -> Result<bool>;
}
