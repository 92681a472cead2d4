// dbbackup/src/backup/logic.rs
use chrono::Local;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::archive::{ArtifactPaths, TIMESTAMP_FORMAT, build_compress_command};
use super::retention::RetentionSet;
use crate::config::BackupConfig;
use crate::engine::build_dump_command;
use crate::errors::BackupError;
use crate::utils::lock::LockFile;
use crate::utils::process::{ProcessRunner, run_checked};

/// Runs one backup: retention, dump, compress+encrypt, cleanup.
/// Returns the path of the new archive.
pub fn perform_backup_orchestration(
    config: &BackupConfig,
    runner: &dyn ProcessRunner,
) -> Result<PathBuf, BackupError> {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    perform_backup_at(config, runner, &timestamp)
}

pub(crate) fn perform_backup_at(
    config: &BackupConfig,
    runner: &dyn ProcessRunner,
    timestamp: &str,
) -> Result<PathBuf, BackupError> {
    let conn = &config.connection;
    let backup_dir = &config.backup_dir;

    fs::create_dir_all(backup_dir).map_err(|source| BackupError::CreateDir {
        path: backup_dir.clone(),
        source,
    })?;

    let lock = acquire_lock(backup_dir, conn.engine.name(), &conn.database)?;
    debug!(lock = %lock.path().display(), "Acquired backup lock");

    let paths = ArtifactPaths::new(backup_dir, conn.engine, &conn.database, timestamp);
    // Same-second reruns map to the same names; never touch a finished artifact.
    for existing in [&paths.archive, &paths.dump] {
        if existing.exists() {
            return Err(BackupError::ArtifactExists(existing.clone()));
        }
    }

    let mut retention = RetentionSet::scan(backup_dir, conn.engine, &conn.database)?;
    debug!(existing = retention.len(), max_backups = config.max_backups, "Scanned retained archives");
    let pruned = retention.make_room(config.max_backups)?;
    if !pruned.is_empty() {
        info!(
            count = pruned.len(),
            max_backups = config.max_backups,
            "Pruned old backups before creating a new one"
        );
    }

    info!(engine = %conn.engine, database = %conn.database, "🔍 Dumping database");
    let dump = build_dump_command(conn, &paths.dump);
    if let Err(failure) = run_checked(runner, &dump) {
        error!(error = %failure, "❌ Error occurred during backup");
        remove_if_exists(&paths.dump);
        return Err(BackupError::DumpFailed(failure));
    }
    info!(engine = %conn.engine, "✅ Backup completed successfully");

    let compress = build_compress_command(&paths.dump, &paths.archive, &config.archive_password);
    if let Err(failure) = run_checked(runner, &compress) {
        error!(error = %failure, dump = %paths.dump.display(), "❌ Error occurred during zipping, raw dump kept");
        remove_if_exists(&paths.archive);
        return Err(BackupError::CompressFailed {
            dump: paths.dump,
            failure,
        });
    }

    if let Err(e) = fs::remove_file(&paths.dump) {
        warn!(path = %paths.dump.display(), error = %e, "Failed to remove temporary SQL file");
    }
    info!(archive = %paths.archive.display(), "✅ Backup compressed and saved");
    Ok(paths.archive)
}

fn acquire_lock(backup_dir: &Path, engine: &str, database: &str) -> Result<LockFile, BackupError> {
    let path = backup_dir.join(format!(".backup_{}_{}.lock", engine, database));
    LockFile::acquire(&path).map_err(|source| {
        if source.kind() == ErrorKind::AlreadyExists {
            BackupError::Locked(path.clone())
        } else {
            BackupError::Lock {
                path: path.clone(),
                source,
            }
        }
    })
}

/// Best-effort removal of a partial artifact.
fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "Removed partial artifact"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial artifact"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackupSettings, ConnectionSettings};
    use crate::engine::Engine;
    use crate::testing::{FakeRunner, dir_entries, touch_archive};
    use tempfile::tempdir;

    fn config(engine: Engine, dir: &Path, max_backups: usize) -> BackupConfig {
        BackupConfig::resolve(BackupSettings {
            connection: ConnectionSettings {
                db_type: Some(engine.name().to_string()),
                db_name: Some("shop".to_string()),
                db_user: Some("app".to_string()),
                db_password: Some("s3cret".to_string()),
                ..Default::default()
            },
            zip_password: Some("zip-pw".to_string()),
            backup_dir: Some(dir.to_path_buf()),
            max_backups: Some(max_backups),
        })
        .unwrap()
    }

    #[test]
    fn test_successful_backup_leaves_only_the_archive() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new();

        let archive =
            perform_backup_at(&config(Engine::Postgres, dir.path(), 3), &runner, "20240301_120000")
                .unwrap();

        assert_eq!(archive, dir.path().join("backup_postgres_shop_20240301_120000.zip"));
        assert_eq!(dir_entries(dir.path()), ["backup_postgres_shop_20240301_120000.zip"]);
        assert_eq!(runner.programs(), ["pg_dump", "zip"]);
    }

    #[test]
    fn test_retention_prunes_oldest_before_adding_new_archive() {
        let dir = tempdir().unwrap();
        touch_archive(dir.path(), "backup_mysql_shop_20240101_000001.zip", 400);
        touch_archive(dir.path(), "backup_mysql_shop_20240101_000002.zip", 300);
        touch_archive(dir.path(), "backup_mysql_shop_20240101_000003.zip", 200);
        touch_archive(dir.path(), "backup_mysql_shop_20240101_000004.zip", 100);
        let runner = FakeRunner::new();

        perform_backup_at(&config(Engine::Mysql, dir.path(), 3), &runner, "20240101_000005").unwrap();

        assert_eq!(
            dir_entries(dir.path()),
            [
                "backup_mysql_shop_20240101_000003.zip",
                "backup_mysql_shop_20240101_000004.zip",
                "backup_mysql_shop_20240101_000005.zip",
            ]
        );
    }

    #[test]
    fn test_steady_state_count_equals_max_for_any_starting_count() {
        for max in 1..=4usize {
            for existing in max..max + 3 {
                let dir = tempdir().unwrap();
                for i in 0..existing {
                    let name = format!("backup_postgres_shop_20230101_{:06}.zip", i);
                    touch_archive(dir.path(), &name, 1000 - i as u64);
                }
                let runner = FakeRunner::new();
                let archive =
                    perform_backup_at(&config(Engine::Postgres, dir.path(), max), &runner, "20240101_000000")
                        .unwrap();

                let set = RetentionSet::scan(dir.path(), Engine::Postgres, "shop").unwrap();
                assert_eq!(set.len(), max, "max={max} existing={existing}");
                // The survivors are the newest ones, ending with the new archive.
                let expected_first = existing - (max - 1);
                let names = dir_entries(dir.path());
                if max > 1 {
                    assert_eq!(names[0], format!("backup_postgres_shop_20230101_{:06}.zip", expected_first));
                }
                assert_eq!(set.archives().last().unwrap().path, archive);
            }
        }
    }

    #[test]
    fn test_other_databases_are_never_pruned() {
        let dir = tempdir().unwrap();
        touch_archive(dir.path(), "backup_postgres_shop_eu_20240101_000001.zip", 500);
        touch_archive(dir.path(), "backup_mysql_shop_20240101_000001.zip", 500);
        touch_archive(dir.path(), "backup_postgres_shop_20240101_000001.zip", 500);
        let runner = FakeRunner::new();

        perform_backup_at(&config(Engine::Postgres, dir.path(), 1), &runner, "20240101_000002").unwrap();

        assert_eq!(
            dir_entries(dir.path()),
            [
                "backup_mysql_shop_20240101_000001.zip",
                "backup_postgres_shop_20240101_000002.zip",
                "backup_postgres_shop_eu_20240101_000001.zip",
            ]
        );
    }

    #[test]
    fn test_dump_failure_leaves_directory_unchanged() {
        let dir = tempdir().unwrap();
        touch_archive(dir.path(), "backup_postgres_shop_20240101_000001.zip", 100);
        let runner = FakeRunner::new().fail_on("pg_dump");

        let err = perform_backup_at(&config(Engine::Postgres, dir.path(), 5), &runner, "20240101_000002")
            .unwrap_err();

        assert!(matches!(err, BackupError::DumpFailed(_)));
        assert_eq!(dir_entries(dir.path()), ["backup_postgres_shop_20240101_000001.zip"]);
        assert_eq!(runner.programs(), ["pg_dump"], "compression must not be attempted");
    }

    #[test]
    fn test_missing_dump_tool_is_a_dump_failure() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new().missing("mysqldump");

        let err = perform_backup_at(&config(Engine::Mysql, dir.path(), 5), &runner, "20240101_000002")
            .unwrap_err();

        assert!(matches!(err, BackupError::DumpFailed(_)));
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_compress_failure_keeps_raw_dump() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new().fail_on("zip");

        let err = perform_backup_at(&config(Engine::Mysql, dir.path(), 5), &runner, "20240101_000002")
            .unwrap_err();

        match err {
            BackupError::CompressFailed { dump, .. } => {
                assert_eq!(dump, dir.path().join("backup_mysql_shop_20240101_000002.sql"));
                assert!(dump.exists());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(dir_entries(dir.path()), ["backup_mysql_shop_20240101_000002.sql"]);
    }

    #[test]
    fn test_existing_archive_with_same_timestamp_is_never_touched() {
        let dir = tempdir().unwrap();
        let prior = dir.path().join("backup_postgres_shop_20240101_000000.zip");
        fs::write(&prior, b"PK\x05\x06").unwrap();
        let runner = FakeRunner::new().fail_on("zip");

        let err = perform_backup_at(&config(Engine::Postgres, dir.path(), 5), &runner, "20240101_000000")
            .unwrap_err();

        assert!(matches!(err, BackupError::ArtifactExists(ref path) if *path == prior));
        assert_eq!(fs::read(&prior).unwrap(), b"PK\x05\x06");
        assert_eq!(dir_entries(dir.path()), ["backup_postgres_shop_20240101_000000.zip"]);
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_kept_raw_dump_with_same_timestamp_blocks_rerun() {
        let dir = tempdir().unwrap();
        let kept = dir.path().join("backup_mysql_shop_20240101_000000.sql");
        fs::write(&kept, "-- earlier dump\n").unwrap();
        let runner = FakeRunner::new();

        let err = perform_backup_at(&config(Engine::Mysql, dir.path(), 5), &runner, "20240101_000000")
            .unwrap_err();

        assert!(matches!(err, BackupError::ArtifactExists(_)));
        assert_eq!(fs::read_to_string(&kept).unwrap(), "-- earlier dump\n");
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_creates_missing_backup_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let runner = FakeRunner::new();

        perform_backup_at(&config(Engine::Postgres, &nested, 2), &runner, "20240101_000000").unwrap();

        assert_eq!(dir_entries(&nested), ["backup_postgres_shop_20240101_000000.zip"]);
    }

    #[test]
    fn test_held_lock_rejects_concurrent_backup() {
        let dir = tempdir().unwrap();
        let _held = LockFile::acquire(dir.path().join(".backup_postgres_shop.lock")).unwrap();
        let runner = FakeRunner::new();

        let err = perform_backup_at(&config(Engine::Postgres, dir.path(), 2), &runner, "20240101_000000")
            .unwrap_err();

        assert!(matches!(err, BackupError::Locked(_)));
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_compress_command_receives_archive_password() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::new();

        perform_backup_at(&config(Engine::Postgres, dir.path(), 2), &runner, "20240101_000000").unwrap();

        let calls = runner.calls();
        assert!(crate::testing::argv(&calls[1]).contains(&"zip-pw".to_string()));
    }
}
