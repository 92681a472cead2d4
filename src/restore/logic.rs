// dbbackup/src/restore/logic.rs
use std::fs::File;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::RestoreConfig;
use crate::engine::{build_create_database_command, build_restore_command};
use crate::errors::{DatabaseCreateWarning, RestoreError};
use crate::utils::process::{ProcessRunner, run_checked};

/// Outcome of a restore that reached the restore step and succeeded.
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub create_warning: Option<DatabaseCreateWarning>,
}

/// Create-database (best effort) followed by restore. No rollback on failure.
pub fn perform_restore_orchestration(
    config: &RestoreConfig,
    runner: &dyn ProcessRunner,
) -> Result<RestoreReport, RestoreError> {
    let conn = &config.connection;
    verify_source(&config.sql_file)?;

    info!(database = %conn.database, "🔍 Checking/Creating database");
    let create = build_create_database_command(conn);
    let create_warning = match run_checked(runner, &create) {
        Ok(()) => {
            info!(database = %conn.database, "✅ Database is ready");
            None
        }
        Err(failure) => {
            let warning = DatabaseCreateWarning {
                database: conn.database.clone(),
                failure,
            };
            warn!("⚠️ {}. Continuing...", warning);
            Some(warning)
        }
    };

    info!(engine = %conn.engine, database = %conn.database, "🔄 Starting restore");
    let restore = build_restore_command(conn, &config.sql_file);
    if let Err(failure) = run_checked(runner, &restore) {
        error!(error = %failure, "❌ Error during restore");
        return Err(RestoreError::RestoreFailed(failure));
    }

    info!(sql_file = %config.sql_file.display(), "✅ Restore completed successfully");
    Ok(RestoreReport { create_warning })
}

/// The source must be an existing, readable regular file.
fn verify_source(sql_file: &Path) -> Result<(), RestoreError> {
    let readable = sql_file.is_file() && File::open(sql_file).is_ok();
    if !readable {
        return Err(RestoreError::SourceNotFound(sql_file.to_path_buf()));
    }
    Ok(())
}
