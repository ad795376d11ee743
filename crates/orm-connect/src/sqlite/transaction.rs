use orm_core::Value;

use crate::context::OpContext;
use crate::error::Result;
use crate::sqlite::source::{run_query_on, SqliteDataSource};
use crate::sqlite::value_conv::bind_args;
use crate::traits::{ExecResult, Row, Transaction};

/// A started transaction on a [`SqliteDataSource`]. Statements re-lock the
/// same connection the `BEGIN` was issued on; rolls back on drop unless
/// [`Transaction::commit`] ran.
pub(crate) struct SqliteTx<'a> {
    source: &'a SqliteDataSource,
    finished: bool,
}

impl<'a> SqliteTx<'a> {
    pub(crate) fn new(source: &'a SqliteDataSource) -> Self {
        SqliteTx {
            source,
            finished: false,
        }
    }
}

impl Transaction for SqliteTx<'_> {
    fn execute(&self, ctx: &OpContext, sql: &str, args: &[Value]) -> Result<ExecResult> {
        ctx.check()?;
        let conn = self
            .source
            .conn
            .lock()
            .expect("sqlite connection mutex poisoned");
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
        args: &[Value],
        visit: &mut dyn FnMut(&dyn Row) -> Result<()>,
    ) -> Result<()> {
        ctx.check()?;
        let conn = self
            .source
            .conn
            .lock()
            .expect("sqlite connection mutex poisoned");
        run_query_on(&conn, sql, args, visit)
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let conn = self
            .source
            .conn
            .lock()
            .expect("sqlite connection mutex poisoned");
        conn.execute_batch("COMMIT")?;
        drop(conn);
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        let conn = self
            .source
            .conn
            .lock()
            .expect("sqlite connection mutex poisoned");
        conn.execute_batch("ROLLBACK")?;
        drop(conn);
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTx<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Ok(conn) = self.source.conn.lock() {
                let _ = conn.execute_batch("ROLLBACK");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DataSource;

    #[test]
    fn commit_persists_changes() {
        let ds = SqliteDataSource::open_in_memory().unwrap();
        let ctx = OpContext::background();
        ds.execute(&ctx, "CREATE TABLE t (id INTEGER PRIMARY KEY)", &[])
            .unwrap();

        let tx = ds.begin(&ctx).unwrap();
        tx.execute(&ctx, "INSERT INTO t DEFAULT VALUES", &[]).unwrap();
        tx.commit().unwrap();

        let mut count = 0i64;
        ds.query(&ctx, "SELECT COUNT(*) FROM t", &[], &mut |row| {
            count = row.value_at(0)?.as_i64().unwrap_or(0);
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn drop_without_commit_rolls_back() {
        let ds = SqliteDataSource::open_in_memory().unwrap();
        let ctx = OpContext::background();
        ds.execute(&ctx, "CREATE TABLE t (id INTEGER PRIMARY KEY)", &[])
            .unwrap();

        {
            let tx = ds.begin(&ctx).unwrap();
            tx.execute(&ctx, "INSERT INTO t DEFAULT VALUES", &[]).unwrap();
            // tx dropped here without commit
        }

        let mut count = 0i64;
        ds.query(&ctx, "SELECT COUNT(*) FROM t", &[], &mut |row| {
            count = row.value_at(0)?.as_i64().unwrap_or(0);
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 0);
    }
}
