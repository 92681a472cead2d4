mod logic;
pub(crate) mod archive;
pub(crate) mod retention;

use std::path::PathBuf;

use crate::config::{BackupConfig, BackupSettings, ListConfig, ListSettings};
use crate::errors::BackupError;
use crate::utils::process::ProcessRunner;
use retention::RetentionSet;

/// Public entry point for the backup process.
/// Settings are validated before the backup directory or any process is touched.
pub fn run_backup_flow(
    settings: BackupSettings,
    runner: &dyn ProcessRunner,
) -> Result<PathBuf, BackupError> {
    let config = BackupConfig::resolve(settings)?;
    logic::perform_backup_orchestration(&config, runner)
}

/// Archives currently retained for one engine+database pair, oldest first.
pub fn list_backups(settings: ListSettings) -> Result<RetentionSet, BackupError> {
    let config = ListConfig::resolve(settings)?;
    RetentionSet::scan(&config.backup_dir, config.engine, &config.database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionSettings;
    use crate::errors::ConfigError;
    use crate::testing::{FakeRunner, touch_archive};
    use tempfile::tempdir;

    #[test]
    fn test_unsupported_engine_has_no_side_effects() {
        let dir = tempdir().unwrap();
        let backup_dir = dir.path().join("never_created");
        let runner = FakeRunner::new();

        let err = run_backup_flow(
            BackupSettings {
                connection: ConnectionSettings {
                    db_type: Some("mssql".to_string()),
                    db_name: Some("shop".to_string()),
                    db_user: Some("app".to_string()),
                    db_password: Some("pw".to_string()),
                    ..Default::default()
                },
                backup_dir: Some(backup_dir.clone()),
                ..Default::default()
            },
            &runner,
        )
        .unwrap_err();

        assert!(matches!(err, BackupError::Config(ConfigError::UnsupportedEngine(_))));
        assert!(!backup_dir.exists());
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_list_backups_oldest_first() {
        let dir = tempdir().unwrap();
        let old = touch_archive(dir.path(), "backup_mysql_crm_20240101_000001.zip", 200);
        let new = touch_archive(dir.path(), "backup_mysql_crm_20240101_000002.zip", 100);

        let listed = list_backups(ListSettings {
            db_type: Some("mysql".to_string()),
            db_name: Some("crm".to_string()),
            backup_dir: Some(dir.path().to_path_buf()),
        })
        .unwrap();

        assert!(!listed.is_empty());
        let paths: Vec<_> = listed.archives().iter().map(|a| a.path.clone()).collect();
        assert_eq!(paths, vec![old, new]);
    }
}
