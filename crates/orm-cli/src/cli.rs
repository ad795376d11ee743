//! Clap CLI definitions.

use clap::{Args, Parser, Subcommand};

/// ormctl -- migration runner front end.
#[derive(Parser, Debug)]
#[command(name = "ormctl", about = "Run and inspect schema migrations", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags available to every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the configuration YAML file.
    #[arg(long, global = true, default_value = "orm.yaml")]
    pub config: String,

    /// Enable debug-level logging.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Migration runner operations.
    #[command(subcommand)]
    Migrate(MigrateCommands),
}

#[derive(Subcommand, Debug)]
pub enum MigrateCommands {
    /// Generate a new, empty migration file.
    Create(CreateArgs),
    /// Apply all pending migrations.
    Up,
    /// Revert the most recently applied migrations.
    Down(DownArgs),
    /// Show which migrations are applied, pending, or orphaned.
    Status,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Descriptive name, e.g. "add users table".
    pub name: String,
}

#[derive(Args, Debug)]
pub struct DownArgs {
    /// Number of applied migrations to revert.
    #[arg(long, default_value_t = 1)]
    pub steps: usize,
}
