//! The migration runner's operations: `create`, `status`, `up`,
//! `down`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use orm_connect::{DataSource, OpContext, Transaction};
use orm_core::Value;

use crate::error::{MigrationError, Result};
use crate::registry;
use crate::unit::{discover_units, MigrationUnit, UnitBody};

/// A single row of the history table.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub applied_at: DateTime<Utc>,
}

/// `status`'s per-unit report.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitStatus {
    Applied { id: String, applied_at: DateTime<Utc> },
    Pending { id: String },
    /// A history entry with no matching file on disk.
    Orphaned { id: String, applied_at: DateTime<Utc> },
}

/// Splits a statement block on `;`, discarding blank pieces. Does not
/// understand string-literal-embedded semicolons -- migration authors who
/// need one should split it into its own unit.
fn split_statements(block: &str) -> Vec<String> {
    block
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_applied_at(value: &Value) -> Result<DateTime<Utc>> {
    let text = value.as_text().unwrap_or_default();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MigrationError::Failed("history".into(), format!("malformed applied_at '{text}'")))
}

/// Ensures the history table exists. Called before any other operation.
pub fn ensure_history_table(ds: &dyn DataSource, ctx: &OpContext, table: &str) -> Result<()> {
    let sql = ds.dialect().create_history_table_sql(table);
    ds.execute(ctx, &sql, &[])?;
    Ok(())
}

/// Lists applied units, ascending by id.
pub fn history(ds: &dyn DataSource, ctx: &OpContext, table: &str) -> Result<Vec<HistoryEntry>> {
    let sql = ds.dialect().list_history_sql(table);
    let mut entries = Vec::new();
    let mut scan_err = None;
    ds.query(ctx, &sql, &[], &mut |row| {
        let id = row.value_at(0)?.as_text().unwrap_or_default().to_string();
        let applied_raw = row.value_at(1)?;
        match parse_applied_at(&applied_raw) {
            Ok(applied_at) => entries.push(HistoryEntry { id, applied_at }),
            Err(e) => scan_err = Some(e),
        }
        Ok(())
    })?;
    if let Some(e) = scan_err {
        return Err(e);
    }
    Ok(entries)
}

/// Generates `<dir>/<utc-ts>_<snake_name>.sql` with an empty marker
/// template, refusing to overwrite an existing file.
pub fn create(dir: &Path, name: &str, now: DateTime<Utc>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|source| MigrationError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let snake_name = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    let file_name = format!("{}_{}.sql", now.format("%Y%m%d%H%M%S"), snake_name);
    let path = dir.join(&file_name);
    if path.exists() {
        return Err(MigrationError::FileExists(path.display().to_string()));
    }

    std::fs::write(&path, "-- +migrate Up\n\n-- +migrate Down\n").map_err(|source| {
        MigrationError::Io {
            path: path.display().to_string(),
            source,
        }
    })?;
    Ok(path)
}

/// Reports each disk unit's applied/pending state and flags orphaned
/// history entries lacking a disk file.
pub fn status(
    dir: &Path,
    ds: &dyn DataSource,
    ctx: &OpContext,
    table: &str,
) -> Result<Vec<UnitStatus>> {
    ensure_history_table(ds, ctx, table)?;
    let units = discover_units(dir)?;
    let applied = history(ds, ctx, table)?;

    let mut report = Vec::with_capacity(units.len());
    for unit in &units {
        match applied.iter().find(|h| h.id == unit.id) {
            Some(h) => report.push(UnitStatus::Applied {
                id: unit.id.clone(),
                applied_at: h.applied_at,
            }),
            None => report.push(UnitStatus::Pending { id: unit.id.clone() }),
        }
    }
    for h in &applied {
        if !units.iter().any(|u| u.id == h.id) {
            tracing::warn!(id = %h.id, "migration history entry has no matching file on disk");
            report.push(UnitStatus::Orphaned {
                id: h.id.clone(),
                applied_at: h.applied_at,
            });
        }
    }
    Ok(report)
}

fn run_unit_body(
    unit: &MigrationUnit,
    ctx: &OpContext,
    handle: &dyn Transaction,
    direction_up: bool,
) -> Result<()> {
    match &unit.body {
        UnitBody::Sql { up, down } => {
            let block = if direction_up { up } else { down };
            for statement in split_statements(block) {
                handle.execute(ctx, &statement, &[])?;
            }
            Ok(())
        }
        UnitBody::Programmatic => {
            let migration = registry::lookup_programmatic(&unit.id)
                .ok_or_else(|| MigrationError::UnknownProgrammaticUnit(unit.id.clone()))?;
            if direction_up {
                migration.up(ctx, handle)
            } else {
                migration.down(ctx, handle)
            }
        }
    }
}

/// Applies all pending units in ascending id order. Each unit runs in its
/// own transaction alongside its history-row insert; the first failure
/// halts the run and leaves previously-committed units applied.
/// Returns the ids applied.
pub fn up(dir: &Path, ds: &dyn DataSource, ctx: &OpContext, table: &str) -> Result<Vec<String>> {
    ensure_history_table(ds, ctx, table)?;
    let units = discover_units(dir)?;
    let applied = history(ds, ctx, table)?;

    let mut ran = Vec::new();
    for unit in &units {
        if applied.iter().any(|h| h.id == unit.id) {
            continue;
        }
        ctx.check()?;

        let tx = ds.begin(ctx)?;
        let result = run_unit_body(unit, ctx, tx.as_ref(), true).and_then(|()| {
            let now = Utc::now();
            let insert_sql = ds.dialect().insert_history_sql(table);
            tx.execute(
                ctx,
                &insert_sql,
                &[Value::Text(unit.id.clone()), Value::DateTime(now)],
            )
            .map(|_| ())
            .map_err(MigrationError::from)
        });

        match result {
            Ok(()) => {
                tx.commit()?;
                ran.push(unit.id.clone());
            }
            Err(e) => {
                tx.rollback()?;
                return Err(MigrationError::Failed(unit.id.clone(), e.to_string()));
            }
        }
    }
    Ok(ran)
}

/// Reverts the top `steps` applied units by descending id, one transaction
/// per unit. Halts on first failure; reverts all applied units if `steps`
/// exceeds the applied count.
pub fn down(
    dir: &Path,
    ds: &dyn DataSource,
    ctx: &OpContext,
    table: &str,
    steps: usize,
) -> Result<Vec<String>> {
    ensure_history_table(ds, ctx, table)?;
    let units = discover_units(dir)?;
    let mut applied = history(ds, ctx, table)?;
    applied.sort_by(|a, b| b.id.cmp(&a.id));
    applied.truncate(steps);

    let mut reverted = Vec::new();
    for entry in &applied {
        ctx.check()?;
        let unit = units
            .iter()
            .find(|u| u.id == entry.id)
            .ok_or_else(|| MigrationError::MissingFileForAppliedUnit(entry.id.clone()))?;

        let tx = ds.begin(ctx)?;
        let delete_sql = ds.dialect().delete_history_sql(table);
        let result = run_unit_body(unit, ctx, tx.as_ref(), false).and_then(|()| {
            tx.execute(ctx, &delete_sql, &[Value::Text(unit.id.clone())])
                .map(|_| ())
                .map_err(MigrationError::from)
        });

        match result {
            Ok(()) => {
                tx.commit()?;
                reverted.push(unit.id.clone());
            }
            Err(e) => {
                tx.rollback()?;
                return Err(MigrationError::Failed(unit.id.clone(), e.to_string()));
            }
        }
    }
    Ok(reverted)
}
