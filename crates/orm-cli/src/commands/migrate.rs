//! `ormctl migrate` command handlers.

use anyhow::Result;

use crate::cli::{CreateArgs, DownArgs};
use crate::context::RuntimeContext;

pub fn create(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    let path = orm_migrate::create(ctx.migration_directory(), &args.name, chrono::Utc::now())?;
    println!("created {}", path.display());
    Ok(())
}

pub fn up(ctx: &RuntimeContext) -> Result<()> {
    let applied = orm_migrate::up(
        ctx.migration_directory(),
        ctx.data_source.as_ref(),
        &ctx.op,
        ctx.history_table(),
    )?;
    if applied.is_empty() {
        println!("no pending migrations");
    } else {
        for id in &applied {
            println!("applied {id}");
        }
    }
    Ok(())
}

pub fn down(ctx: &RuntimeContext, args: &DownArgs) -> Result<()> {
    let reverted = orm_migrate::down(
        ctx.migration_directory(),
        ctx.data_source.as_ref(),
        &ctx.op,
        ctx.history_table(),
        args.steps,
    )?;
    if reverted.is_empty() {
        println!("no applied migrations to revert");
    } else {
        for id in &reverted {
            println!("reverted {id}");
        }
    }
    Ok(())
}

pub fn status(ctx: &RuntimeContext) -> Result<()> {
    let report = orm_migrate::status(
        ctx.migration_directory(),
        ctx.data_source.as_ref(),
        &ctx.op,
        ctx.history_table(),
    )?;
    for entry in report {
        match entry {
            orm_migrate::UnitStatus::Applied { id, applied_at } => {
                println!("{id}  applied  {applied_at}");
            }
            orm_migrate::UnitStatus::Pending { id } => {
                println!("{id}  pending");
            }
            orm_migrate::UnitStatus::Orphaned { id, applied_at } => {
                println!("{id}  orphaned (applied {applied_at}, no file on disk)");
            }
        }
    }
    Ok(())
}
