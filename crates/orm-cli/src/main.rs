//! `ormctl` -- migration runner command-line front end.

mod cli;
mod commands;
mod context;

use clap::Parser;

use cli::{Cli, Commands, MigrateCommands};
use context::RuntimeContext;

fn main() {
    let cli = Cli::parse();

    let ctx = match RuntimeContext::load(&cli.global) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Migrate(MigrateCommands::Create(args)) => commands::migrate::create(&ctx, &args),
        Commands::Migrate(MigrateCommands::Up) => commands::migrate::up(&ctx),
        Commands::Migrate(MigrateCommands::Down(args)) => commands::migrate::down(&ctx, &args),
        Commands::Migrate(MigrateCommands::Status) => commands::migrate::status(&ctx),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
