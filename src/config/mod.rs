// dbbackup/src/config/mod.rs
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::Engine;
use crate::errors::ConfigError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_ARCHIVE_PASSWORD: &str = "backup123";
pub const DEFAULT_BACKUP_DIR: &str = "./db_backups";
pub const DEFAULT_MAX_BACKUPS: usize = 5;

/// Optional JSON config file. Every field may be omitted; command line flags
/// and environment variables take precedence over anything set here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawJsonConfig {
    pub db_type: Option<String>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub zip_password: Option<String>,
    pub backup_dir: Option<PathBuf>,
    pub max_backups: Option<usize>,
    pub sql_file: Option<PathBuf>,
}

impl RawJsonConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self, ConfigError> {
        let config_content = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&config_content).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }
}

// Unvalidated settings, as collected from flags, environment and config file.

#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    pub db_type: Option<String>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
}

impl ConnectionSettings {
    pub fn merge_file(mut self, file: &RawJsonConfig) -> Self {
        self.db_type = self.db_type.or_else(|| file.db_type.clone());
        self.db_name = self.db_name.or_else(|| file.db_name.clone());
        self.db_user = self.db_user.or_else(|| file.db_user.clone());
        self.db_password = self.db_password.or_else(|| file.db_password.clone());
        self.db_host = self.db_host.or_else(|| file.db_host.clone());
        self.db_port = self.db_port.or(file.db_port);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackupSettings {
    pub connection: ConnectionSettings,
    pub zip_password: Option<String>,
    pub backup_dir: Option<PathBuf>,
    pub max_backups: Option<usize>,
}

impl BackupSettings {
    pub fn merge_file(self, file: &RawJsonConfig) -> Self {
        BackupSettings {
            connection: self.connection.merge_file(file),
            zip_password: self.zip_password.or_else(|| file.zip_password.clone()),
            backup_dir: self.backup_dir.or_else(|| file.backup_dir.clone()),
            max_backups: self.max_backups.or(file.max_backups),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RestoreSettings {
    pub connection: ConnectionSettings,
    pub sql_file: Option<PathBuf>,
}

impl RestoreSettings {
    pub fn merge_file(self, file: &RawJsonConfig) -> Self {
        RestoreSettings {
            connection: self.connection.merge_file(file),
            sql_file: self.sql_file.or_else(|| file.sql_file.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListSettings {
    pub db_type: Option<String>,
    pub db_name: Option<String>,
    pub backup_dir: Option<PathBuf>,
}

impl ListSettings {
    pub fn merge_file(self, file: &RawJsonConfig) -> Self {
        ListSettings {
            db_type: self.db_type.or_else(|| file.db_type.clone()),
            db_name: self.db_name.or_else(|| file.db_name.clone()),
            backup_dir: self.backup_dir.or_else(|| file.backup_dir.clone()),
        }
    }
}

// Validated configuration.

#[derive(Clone)]
pub struct ConnectionConfig {
    pub engine: Engine,
    pub database: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("engine", &self.engine)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct BackupConfig {
    pub connection: ConnectionConfig,
    pub archive_password: String,
    pub backup_dir: PathBuf,
    pub max_backups: usize,
}

impl std::fmt::Debug for BackupConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupConfig")
            .field("connection", &self.connection)
            .field("backup_dir", &self.backup_dir)
            .field("max_backups", &self.max_backups)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct RestoreConfig {
    pub connection: ConnectionConfig,
    pub sql_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ListConfig {
    pub engine: Engine,
    pub database: String,
    pub backup_dir: PathBuf,
}

fn parse_engine(db_type: Option<String>) -> Result<Engine, ConfigError> {
    db_type.ok_or(ConfigError::MissingField("db_type"))?.parse()
}

/// Database names end up in file names and SQL identifiers.
fn validate_database_name(name: Option<String>) -> Result<String, ConfigError> {
    let name = name.ok_or(ConfigError::MissingField("db_name"))?;
    if name.trim().is_empty()
        || name.contains(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-')
    {
        return Err(ConfigError::InvalidDatabaseName(name));
    }
    Ok(name)
}

impl ConnectionConfig {
    /// The engine is resolved first so an unsupported value is reported ahead
    /// of anything else.
    pub fn resolve(settings: ConnectionSettings) -> Result<Self, ConfigError> {
        let engine = parse_engine(settings.db_type)?;
        let database = validate_database_name(settings.db_name)?;
        let user = settings.db_user.ok_or(ConfigError::MissingField("db_user"))?;
        let password = settings
            .db_password
            .ok_or(ConfigError::MissingField("db_password"))?;

        Ok(ConnectionConfig {
            engine,
            database,
            user,
            password,
            host: settings.db_host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: settings.db_port.unwrap_or_else(|| engine.default_port()),
        })
    }
}

impl BackupConfig {
    pub fn resolve(settings: BackupSettings) -> Result<Self, ConfigError> {
        let connection = ConnectionConfig::resolve(settings.connection)?;
        let max_backups = settings.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
        if max_backups == 0 {
            return Err(ConfigError::InvalidRetention(max_backups));
        }

        Ok(BackupConfig {
            connection,
            archive_password: settings
                .zip_password
                .unwrap_or_else(|| DEFAULT_ARCHIVE_PASSWORD.to_string()),
            backup_dir: settings
                .backup_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR)),
            max_backups,
        })
    }
}

impl RestoreConfig {
    pub fn resolve(settings: RestoreSettings) -> Result<Self, ConfigError> {
        let connection = ConnectionConfig::resolve(settings.connection)?;
        let sql_file = settings.sql_file.ok_or(ConfigError::MissingField("sql_file"))?;
        Ok(RestoreConfig {
            connection,
            sql_file,
        })
    }
}

impl ListConfig {
    pub fn resolve(settings: ListSettings) -> Result<Self, ConfigError> {
        Ok(ListConfig {
            engine: parse_engine(settings.db_type)?,
            database: validate_database_name(settings.db_name)?,
            backup_dir: settings
                .backup_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR)),
        })
    }
}
