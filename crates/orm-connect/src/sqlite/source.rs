use std::path::Path;
use std::sync::Mutex;

use orm_dialect::{Dialect, DriverTag, SqliteDialect};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::context::OpContext;
use crate::error::{ConnectError, Result};
use crate::sqlite::row::SqliteRow;
use crate::sqlite::transaction::SqliteTx;
use crate::sqlite::value_conv::bind_args;
use crate::traits::{DataSource, ExecResult, Row, Transaction};

/// SQLite-backed [`DataSource`]. Wraps a single [`rusqlite::Connection`] in
/// a `Mutex`, following `SqliteStore`'s one-connection-per-handle model
/// rather than a pool -- consistent with the documented no-op pool
/// configuration for this backend.
pub struct SqliteDataSource {
    pub(crate) conn: Mutex<Connection>,
}

impl SqliteDataSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(?path, "opening sqlite data source");
        let conn = Connection::open(path)
            .map_err(|e| ConnectError::Open(format!("{}: {e}", path.display())))?;
        let source = SqliteDataSource {
            conn: Mutex::new(conn),
        };
        source.configure()?;
        Ok(source)
    }

    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory sqlite data source");
        let conn = Connection::open_in_memory()
            .map_err(|e| ConnectError::Open(format!("in-memory: {e}")))?;
        let source = SqliteDataSource {
            conn: Mutex::new(conn),
        };
        source.configure()?;
        Ok(source)
    }

    fn configure(&self) -> Result<()> {
        let conn = self.conn.lock().expect("sqlite connection mutex poisoned");
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        Ok(())
    }
}

pub(crate) fn run_query_on(
    conn: &Connection,
    sql: &str,
    args: &[orm_core::Value],
    visit: &mut dyn FnMut(&dyn Row) -> Result<()>,
) -> Result<()> {
    let bound = bind_args(args);
    let params: Vec<&dyn rusqlite::ToSql> = bound.iter().map(|b| b as &dyn rusqlite::ToSql).collect();
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params.as_slice())?;
    while let Some(row) = rows.next()? {
        let owned = SqliteRow::from_rusqlite(row)?;
        visit(&owned)?;
    }
    Ok(())
}

impl DataSource for SqliteDataSource {
    fn driver_tag(&self) -> DriverTag {
        DriverTag::Sqlite
    }

    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn execute(&self, ctx: &OpContext, sql: &str, args: &[orm_core::Value]) -> Result<ExecResult> {
        ctx.check()?;
        let conn = self.conn.lock().expect("sqlite connection mutex poisoned");
        let bound = bind_args(args);
        let params: Vec<&dyn rusqlite::ToSql> =
            bound.iter().map(|b| b as &dyn rusqlite::ToSql).collect();
        let rows_affected = conn.execute(sql, params.as_slice())? as u64;
        let last_insert_id = if rows_affected > 0 {
            let id = conn.last_insert_rowid();
            if id != 0 {
                Some(id)
            } else {
                None
            }
        } else {
            None
        };
        Ok(ExecResult {
            rows_affected,
            last_insert_id,
        })
    }

    fn query(
        &self,
        ctx: &OpContext,
        sql: &str,
        args: &[orm_core::Value],
        visit: &mut dyn FnMut(&dyn Row) -> Result<()>,
    ) -> Result<()> {
        ctx.check()?;
        let conn = self.conn.lock().expect("sqlite connection mutex poisoned");
        run_query_on(&conn, sql, args, visit)
    }

    fn begin<'a>(&'a self, ctx: &OpContext) -> Result<Box<dyn Transaction + 'a>> {
        ctx.check()?;
        let conn = self.conn.lock().expect("sqlite connection mutex poisoned");
        conn.execute_batch("BEGIN")?;
        drop(conn);
        Ok(Box::new(SqliteTx::new(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orm_core::Value;

    #[test]
    fn insert_and_query_round_trip() {
        let ds = SqliteDataSource::open_in_memory().unwrap();
        let ctx = OpContext::background();
        ds.execute(&ctx, "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &[])
            .unwrap();
        let result = ds
            .execute(
                &ctx,
                "INSERT INTO t (name) VALUES (?)",
                &[Value::Text("alice".into())],
            )
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));

        let mut names = Vec::new();
        ds.query(&ctx, "SELECT name FROM t", &[], &mut |row| {
            names.push(row.value_by_name("name")?.as_text().map(str::to_string));
            Ok(())
        })
        .unwrap();
        assert_eq!(names, vec![Some("alice".to_string())]);
    }

    #[test]
    fn cancelled_context_short_circuits() {
        let ds = SqliteDataSource::open_in_memory().unwrap();
        let ctx = OpContext::background();
        ctx.cancel();
        assert!(ds.execute(&ctx, "SELECT 1", &[]).is_err());
    }
}
