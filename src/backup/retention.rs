// dbbackup/src/backup/retention.rs
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

use crate::engine::Engine;
use crate::errors::BackupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Existing `.zip` archives of one engine+database pair, oldest first.
#[derive(Debug, Default)]
pub struct RetentionSet {
    archives: Vec<ArchiveEntry>,
}

fn archive_pattern(engine: Engine, database: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"^backup_{}_{}_\d{{8}}_\d{{6}}\.zip$",
        engine.name(),
        regex::escape(database)
    ))
}

impl RetentionSet {
    /// Lists the archives in `backup_dir`. A missing directory is an empty set.
    pub fn scan(backup_dir: &Path, engine: Engine, database: &str) -> Result<Self, BackupError> {
        let pattern = archive_pattern(engine, database)?;
        let list_err = |source: std::io::Error| BackupError::ListDir {
            path: backup_dir.to_path_buf(),
            source,
        };

        let entries = match fs::read_dir(backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(list_err(e)),
        };

        let mut archives = Vec::new();
        for entry in entries {
            let entry = entry.map_err(list_err)?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !pattern.is_match(name) {
                continue;
            }
            let metadata = entry.metadata().map_err(list_err)?;
            if !metadata.is_file() {
                continue;
            }
            archives.push(ArchiveEntry {
                path: entry.path(),
                modified: metadata.modified().map_err(list_err)?,
            });
        }

        // Names embed the timestamp, so they break mtime ties deterministically.
        archives.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        Ok(RetentionSet { archives })
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    pub fn archives(&self) -> &[ArchiveEntry] {
        &self.archives
    }

    /// Deletes oldest archives while the count is at or above `max_backups`,
    /// leaving room for exactly one new archive. Returns the deleted paths.
    pub fn make_room(&mut self, max_backups: usize) -> Result<Vec<PathBuf>, BackupError> {
        let mut deleted = Vec::new();
        while !self.archives.is_empty() && self.archives.len() >= max_backups {
            let oldest = self.archives.remove(0);
            fs::remove_file(&oldest.path).map_err(|source| BackupError::Prune {
                path: oldest.path.clone(),
                source,
            })?;
            info!(path = %oldest.path.display(), "🗑 Deleted old backup");
            deleted.push(oldest.path);
        }
        Ok(deleted)
    }
}
