use std::path::PathBuf;
use thiserror::Error;

/// Problems found while resolving settings into a validated configuration.
/// These are always raised before any directory or process side effect.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unsupported database engine: '{0}' (expected 'postgres' or 'mysql')")]
    UnsupportedEngine(String),

    #[error("Retention count must be at least 1, got {0}")]
    InvalidRetention(usize),

    #[error("Invalid database name: '{0}' (allowed: letters, digits, '_' and '-')")]
    InvalidDatabaseName(String),

    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The external process could not be started at all.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{program} executable not found in PATH. Please ensure the client tools are installed")]
    NotFound {
        program: String,
        source: which::Error,
    },

    #[error("Failed to open {path} for {program}: {source}")]
    Redirect {
        program: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Why a single external step did not succeed.
#[derive(Error, Debug)]
pub enum StepFailure {
    #[error("{program} exited with status {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

#[derive(Error, Debug)]
pub enum BackupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create backup directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Another backup of this database is in progress (lock file {0})")]
    Locked(PathBuf),

    #[error("Failed to create lock file {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to list backups in {path}: {source}")]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid archive name pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to delete old backup {path}: {source}")]
    Prune {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Backup artifact {0} already exists; refusing to overwrite it")]
    ArtifactExists(PathBuf),

    #[error("Database dump failed: {0}")]
    DumpFailed(#[source] StepFailure),

    #[error("Compression failed, raw dump kept at {dump}: {failure}")]
    CompressFailed {
        dump: PathBuf,
        #[source]
        failure: StepFailure,
    },
}

impl BackupError {
    pub fn exit_code(&self) -> u8 {
        match self {
            BackupError::Config(_) => 2,
            BackupError::DumpFailed(_) => 4,
            BackupError::CompressFailed { .. } => 5,
            BackupError::Locked(_) => 7,
            _ => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("SQL file not found or not readable: {0}")]
    SourceNotFound(PathBuf),

    #[error("Restore failed: {0}")]
    RestoreFailed(#[source] StepFailure),
}

impl RestoreError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RestoreError::Config(_) => 2,
            RestoreError::SourceNotFound(_) => 3,
            RestoreError::RestoreFailed(_) => 6,
        }
    }
}

/// Non-fatal: the create-database step failed, most often because the
/// database already exists. The restore continues regardless.
#[derive(Error, Debug)]
#[error("Could not create database '{database}' (it may already exist): {failure}")]
pub struct DatabaseCreateWarning {
    pub database: String,
    #[source]
    pub failure: StepFailure,
}
