// dbbackup/src/backup/archive.rs
use std::path::{Path, PathBuf};

use crate::engine::Engine;
use crate::utils::process::CommandSpec;

/// `%Y%m%d_%H%M%S`, second resolution.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Paths of one backup run: the transient raw dump and the final archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dump: PathBuf,
    pub archive: PathBuf,
}

impl ArtifactPaths {
    pub fn new(backup_dir: &Path, engine: Engine, database: &str, timestamp: &str) -> Self {
        let stem = format!("backup_{}_{}_{}", engine.name(), database, timestamp);
        ArtifactPaths {
            dump: backup_dir.join(format!("{stem}.sql")),
            archive: backup_dir.join(format!("{stem}.zip")),
        }
    }
}

/// Password-protected zip of a single file, stored without its directory path.
pub fn build_compress_command(input: &Path, output_zip: &Path, password: &str) -> CommandSpec {
    CommandSpec::new("zip")
        .arg("-j")
        .arg("-P")
        .secret_arg(password)
        .arg(output_zip)
        .arg(input)
}
