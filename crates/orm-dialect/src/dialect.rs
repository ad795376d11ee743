//! The [`Dialect`] trait and its four relational implementations.

use orm_core::Value;

use crate::error::{DialectError, Result};

/// Inputs to [`Dialect::paginate`]. `next_ordinal` is the zero-based
/// ordinal the first paging placeholder should use, continuing on from
/// whatever placeholders the caller has already bound for `WHERE`.
pub struct PaginateRequest<'a> {
    pub has_order_by: bool,
    pub single_pk_column: Option<&'a str>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub next_ordinal: usize,
}

/// Output of [`Dialect::paginate`]. The caller appends `synthesized_order_by`
/// (only present when the request had none) and then `clause_sql` to the
/// statement being built, and extends its argument list with `extra_args`.
#[derive(Debug)]
pub struct PaginateResult {
    pub synthesized_order_by: Option<String>,
    pub clause_sql: String,
    pub extra_args: Vec<Value>,
}

impl PaginateResult {
    fn none() -> Self {
        PaginateResult {
            synthesized_order_by: None,
            clause_sql: String::new(),
            extra_args: Vec::new(),
        }
    }
}

/// A backend's grammar and capability profile. One implementation per
/// backend; the CRUD engine, query builder, and migration runner never
/// branch on backend identity directly, only through this trait.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// The placeholder token for the zero-based argument `ordinal`.
    fn placeholder(&self, ordinal: usize) -> String;

    /// Quotes a SQL identifier (table or column name). Identifiers only
    /// ever originate from validated metadata — never from caller strings
    /// — so this need not escape caller-controlled input.
    fn quote(&self, identifier: &str) -> String;

    /// Whether the backend can report the identity generated by an
    /// auto-increment insert. `false` for SQL Server in this profile set.
    fn supports_last_inserted_id(&self) -> bool;

    fn create_history_table_sql(&self, table: &str) -> String;
    fn insert_history_sql(&self, table: &str) -> String;
    fn delete_history_sql(&self, table: &str) -> String;
    fn list_history_sql(&self, table: &str) -> String;

    /// Computes the pagination clause (and, for SQL Server, a synthesized
    /// `ORDER BY` when none was supplied) for the given request.
    fn paginate(&self, req: PaginateRequest<'_>) -> Result<PaginateResult>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }
    fn placeholder(&self, _ordinal: usize) -> String {
        "?".to_string()
    }
    fn quote(&self, identifier: &str) -> String {
        format!("\"{identifier}\"")
    }
    fn supports_last_inserted_id(&self) -> bool {
        true
    }
    fn create_history_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, applied_at TEXT NOT NULL)",
            self.quote(table)
        )
    }
    fn insert_history_sql(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} (id, applied_at) VALUES (?, ?)",
            self.quote(table)
        )
    }
    fn delete_history_sql(&self, table: &str) -> String {
        format!("DELETE FROM {} WHERE id = ?", self.quote(table))
    }
    fn list_history_sql(&self, table: &str) -> String {
        format!(
            "SELECT id, applied_at FROM {} ORDER BY id ASC",
            self.quote(table)
        )
    }
    fn paginate(&self, req: PaginateRequest<'_>) -> Result<PaginateResult> {
        if req.limit.is_none() && req.offset.is_none() {
            return Ok(PaginateResult::none());
        }
        let mut args = Vec::new();
        let mut sql = String::new();
        match (req.limit, req.offset) {
            (Some(_), _) => {
                sql.push_str(&format!("LIMIT {}", self.placeholder(req.next_ordinal)));
                args.push(Value::I64(req.limit.unwrap() as i64));
            }
            (None, Some(_)) => {
                // SQLite requires a LIMIT to use OFFSET; -1 means unbounded.
                sql.push_str("LIMIT -1");
            }
            (None, None) => unreachable!(),
        }
        if let Some(offset) = req.offset {
            sql.push_str(&format!(
                " OFFSET {}",
                self.placeholder(req.next_ordinal + args.len())
            ));
            args.push(Value::I64(offset as i64));
        }
        Ok(PaginateResult {
            synthesized_order_by: None,
            clause_sql: sql,
            extra_args: args,
        })
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }
    fn placeholder(&self, ordinal: usize) -> String {
        format!("${}", ordinal + 1)
    }
    fn quote(&self, identifier: &str) -> String {
        format!("\"{identifier}\"")
    }
    fn supports_last_inserted_id(&self) -> bool {
        true
    }
    fn create_history_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, applied_at TIMESTAMPTZ NOT NULL)",
            self.quote(table)
        )
    }
    fn insert_history_sql(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} (id, applied_at) VALUES ({}, {})",
            self.quote(table),
            self.placeholder(0),
            self.placeholder(1)
        )
    }
    fn delete_history_sql(&self, table: &str) -> String {
        format!(
            "DELETE FROM {} WHERE id = {}",
            self.quote(table),
            self.placeholder(0)
        )
    }
    fn list_history_sql(&self, table: &str) -> String {
        format!(
            "SELECT id, applied_at FROM {} ORDER BY id ASC",
            self.quote(table)
        )
    }
    fn paginate(&self, req: PaginateRequest<'_>) -> Result<PaginateResult> {
        if req.limit.is_none() && req.offset.is_none() {
            return Ok(PaginateResult::none());
        }
        if req.limit.is_none() {
            tracing::warn!("OFFSET without LIMIT on postgres: pagination behavior is a portable-rule open question");
        }
        let mut args = Vec::new();
        let mut sql = String::new();
        if let Some(limit) = req.limit {
            sql.push_str(&format!("LIMIT {}", self.placeholder(req.next_ordinal)));
            args.push(Value::I64(limit as i64));
        }
        if let Some(offset) = req.offset {
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(&format!(
                "OFFSET {}",
                self.placeholder(req.next_ordinal + args.len())
            ));
            args.push(Value::I64(offset as i64));
        }
        Ok(PaginateResult {
            synthesized_order_by: None,
            clause_sql: sql,
            extra_args: args,
        })
    }
}

// ---------------------------------------------------------------------------
// MySQL / MariaDB
// ---------------------------------------------------------------------------

pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }
    fn placeholder(&self, _ordinal: usize) -> String {
        "?".to_string()
    }
    fn quote(&self, identifier: &str) -> String {
        format!("`{identifier}`")
    }
    fn supports_last_inserted_id(&self) -> bool {
        true
    }
    fn create_history_table_sql(&self, table: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (id VARCHAR(255) PRIMARY KEY, applied_at DATETIME NOT NULL)",
            self.quote(table)
        )
    }
    fn insert_history_sql(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} (id, applied_at) VALUES (?, ?)",
            self.quote(table)
        )
    }
    fn delete_history_sql(&self, table: &str) -> String {
        format!("DELETE FROM {} WHERE id = ?", self.quote(table))
    }
    fn list_history_sql(&self, table: &str) -> String {
        format!(
            "SELECT id, applied_at FROM {} ORDER BY id ASC",
            self.quote(table)
        )
    }
    fn paginate(&self, req: PaginateRequest<'_>) -> Result<PaginateResult> {
        if req.limit.is_none() && req.offset.is_none() {
            return Ok(PaginateResult::none());
        }
        let mut args = Vec::new();
        let mut sql = String::new();
        match req.limit {
            Some(limit) => {
                sql.push_str(&format!("LIMIT {}", self.placeholder(req.next_ordinal)));
                args.push(Value::I64(limit as i64));
            }
            None => {
                tracing::warn!("OFFSET without LIMIT on mysql: emitting an unbounded LIMIT sentinel, a documented non-portable fallback");
                sql.push_str("LIMIT 18446744073709551615");
            }
        }
        if let Some(offset) = req.offset {
            sql.push_str(&format!(
                " OFFSET {}",
                self.placeholder(req.next_ordinal + args.len())
            ));
            args.push(Value::I64(offset as i64));
        }
        Ok(PaginateResult {
            synthesized_order_by: None,
            clause_sql: sql,
            extra_args: args,
        })
    }
}

// ---------------------------------------------------------------------------
// SQL Server
// ---------------------------------------------------------------------------

pub struct MsSqlDialect;

impl Dialect for MsSqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }
    fn placeholder(&self, ordinal: usize) -> String {
        format!("@p{}", ordinal + 1)
    }
    fn quote(&self, identifier: &str) -> String {
        format!("[{identifier}]")
    }
    fn supports_last_inserted_id(&self) -> bool {
        // identity write-back is never attempted against this dialect, so
        // the CRUD layer always skips it rather than guessing at wiring
        // this workspace has no backend to exercise.
        false
    }
    fn create_history_table_sql(&self, table: &str) -> String {
        format!(
            "IF NOT EXISTS (SELECT * FROM sysobjects WHERE name='{table}' AND xtype='U') \
             CREATE TABLE {} (id NVARCHAR(255) PRIMARY KEY, applied_at DATETIME2 NOT NULL)",
            self.quote(table)
        )
    }
    fn insert_history_sql(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} (id, applied_at) VALUES ({}, {})",
            self.quote(table),
            self.placeholder(0),
            self.placeholder(1)
        )
    }
    fn delete_history_sql(&self, table: &str) -> String {
        format!(
            "DELETE FROM {} WHERE id = {}",
            self.quote(table),
            self.placeholder(0)
        )
    }
    fn list_history_sql(&self, table: &str) -> String {
        format!(
            "SELECT id, applied_at FROM {} ORDER BY id ASC",
            self.quote(table)
        )
    }
    fn paginate(&self, req: PaginateRequest<'_>) -> Result<PaginateResult> {
        if req.limit.is_none() && req.offset.is_none() {
            return Ok(PaginateResult::none());
        }
        let synthesized_order_by = if req.has_order_by {
            None
        } else {
            let pk = req.single_pk_column.ok_or(DialectError::MissingOrderBy)?;
            Some(format!("ORDER BY {} ASC", self.quote(pk)))
        };

        let mut args = Vec::new();
        let offset = req.offset.unwrap_or(0);
        let mut sql = format!(
            "OFFSET {} ROWS",
            self.placeholder(req.next_ordinal)
        );
        args.push(Value::I64(offset as i64));
        if let Some(limit) = req.limit {
            sql.push_str(&format!(
                " FETCH NEXT {} ROWS ONLY",
                self.placeholder(req.next_ordinal + args.len())
            ));
            args.push(Value::I64(limit as i64));
        }
        Ok(PaginateResult {
            synthesized_order_by,
            clause_sql: sql,
            extra_args: args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_per_dialect() {
        assert_eq!(SqliteDialect.placeholder(0), "?");
        assert_eq!(SqliteDialect.placeholder(5), "?");
        assert_eq!(PostgresDialect.placeholder(0), "$1");
        assert_eq!(PostgresDialect.placeholder(4), "$5");
        assert_eq!(MySqlDialect.placeholder(3), "?");
        assert_eq!(MsSqlDialect.placeholder(0), "@p1");
        assert_eq!(MsSqlDialect.placeholder(2), "@p3");
    }

    #[test]
    fn mssql_identity_never_supported() {
        assert!(!MsSqlDialect.supports_last_inserted_id());
        assert!(SqliteDialect.supports_last_inserted_id());
        assert!(PostgresDialect.supports_last_inserted_id());
        assert!(MySqlDialect.supports_last_inserted_id());
    }

    #[test]
    fn sqlite_offset_without_limit_uses_negative_one() {
        let r = SqliteDialect
            .paginate(PaginateRequest {
                has_order_by: true,
                single_pk_column: None,
                limit: None,
                offset: Some(5),
                next_ordinal: 0,
            })
            .unwrap();
        assert_eq!(r.clause_sql, "LIMIT -1 OFFSET ?");
        assert_eq!(r.extra_args, vec![Value::I64(5)]);
    }

    #[test]
    fn mssql_requires_order_by_or_single_pk() {
        let err = MsSqlDialect
            .paginate(PaginateRequest {
                has_order_by: false,
                single_pk_column: None,
                limit: Some(10),
                offset: Some(0),
                next_ordinal: 0,
            })
            .unwrap_err();
        assert_eq!(err, DialectError::MissingOrderBy);
    }

    #[test]
    fn mssql_synthesizes_order_by_from_single_pk() {
        let r = MsSqlDialect
            .paginate(PaginateRequest {
                has_order_by: false,
                single_pk_column: Some("id"),
                limit: Some(10),
                offset: Some(20),
                next_ordinal: 0,
            })
            .unwrap();
        assert_eq!(r.synthesized_order_by.as_deref(), Some("ORDER BY [id] ASC"));
        assert_eq!(r.clause_sql, "OFFSET @p1 ROWS FETCH NEXT @p2 ROWS ONLY");
        assert_eq!(r.extra_args, vec![Value::I64(20), Value::I64(10)]);
    }

    #[test]
    fn no_pagination_requested_is_empty() {
        let r = SqliteDialect
            .paginate(PaginateRequest {
                has_order_by: false,
                single_pk_column: None,
                limit: None,
                offset: None,
                next_ordinal: 0,
            })
            .unwrap();
        assert!(r.clause_sql.is_empty());
        assert!(r.extra_args.is_empty());
    }
}
