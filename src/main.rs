//! Database Backup/Restore Tool
//!
//! Password-protected PostgreSQL/MySQL backups with retention, and restores,
//! driven by the engines' own client tools.

// dbbackup/src/main.rs
mod backup;
mod cli;
mod config;
mod engine;
mod errors;
mod restore;
mod utils;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use config::{BackupSettings, ListSettings, RawJsonConfig, RestoreSettings};
use errors::{BackupError, ConfigError, RestoreError};
use utils::process::SystemRunner;

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run_app(cli) {
        Ok(()) => {
            info!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn run_app(cli: Cli) -> Result<()> {
    let file_config = match &cli.config {
        Some(path) => RawJsonConfig::load_from_json(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => RawJsonConfig::default(),
    };
    let runner = SystemRunner;

    match cli.command {
        Commands::Backup(args) => {
            info!("🚀 Starting Backup Process...");
            let settings = BackupSettings::from(args).merge_file(&file_config);
            let archive = backup::run_backup_flow(settings, &runner).context("Backup process failed")?;
            info!(archive = %archive.display(), "Backup stored");
        }
        Commands::Restore(args) => {
            info!("🔄 Starting Restore Process...");
            let settings = RestoreSettings::from(args).merge_file(&file_config);
            let report = restore::run_restore_flow(settings, &runner).context("Restore process failed")?;
            if report.create_warning.is_some() {
                info!("Restore finished; the database was not newly created");
            }
        }
        Commands::List(args) => {
            let settings = ListSettings::from(args).merge_file(&file_config);
            let archives = backup::list_backups(settings).context("Failed to list backups")?;
            if archives.is_empty() {
                println!("No backups found.");
            }
            for archive in archives.archives() {
                let modified: DateTime<Local> = archive.modified.into();
                println!("{}  {}", modified.format("%Y-%m-%d %H:%M:%S"), archive.path.display());
            }
        }
    }
    Ok(())
}

/// Maps the failure kind to a process exit status.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<BackupError>() {
        e.exit_code()
    } else if let Some(e) = err.downcast_ref::<RestoreError>() {
        e.exit_code()
    } else if err.downcast_ref::<ConfigError>().is_some() {
        2
    } else {
        1
    }
}
