// dbbackup/src/cli.rs
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{BackupSettings, ConnectionSettings, ListSettings, RestoreSettings};

#[derive(Parser)]
#[command(name = "dbbackup", version)]
#[command(about = "Password-protected PostgreSQL/MySQL backups with retention, and restores", long_about = None)]
pub struct Cli {
    /// JSON file providing values for any flag not given on the command line
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dump a database into a password-protected zip, pruning old archives first
    Backup(BackupArgs),

    /// Create the database if possible, then load a SQL file into it
    Restore(RestoreArgs),

    /// List retained archives for a database, oldest first
    List(ListArgs),
}

#[derive(Args)]
pub struct ConnectionArgs {
    /// Database type: postgres or mysql
    #[arg(long, env = "DB_TYPE")]
    pub db_type: Option<String>,

    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database host (default: localhost)
    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    /// Database port (default: 5432 for postgres, 3306 for mysql)
    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,
}

#[derive(Args)]
pub struct BackupArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Password for the zip archive (default: backup123)
    #[arg(long, env = "ZIP_PASSWORD", hide_env_values = true)]
    pub zip_password: Option<String>,

    /// Directory to store backups (default: ./db_backups)
    #[arg(long, env = "BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Number of archives kept per database after a backup (default: 5)
    #[arg(long, env = "MAX_BACKUPS")]
    pub max_backups: Option<usize>,
}

#[derive(Args)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Path to the .sql file to restore
    #[arg(long)]
    pub sql_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, env = "DB_TYPE")]
    pub db_type: Option<String>,

    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    #[arg(long, env = "BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,
}

impl From<ConnectionArgs> for ConnectionSettings {
    fn from(args: ConnectionArgs) -> Self {
        ConnectionSettings {
            db_type: args.db_type,
            db_name: args.db_name,
            db_user: args.db_user,
            db_password: args.db_password,
            db_host: args.db_host,
            db_port: args.db_port,
        }
    }
}

impl From<BackupArgs> for BackupSettings {
    fn from(args: BackupArgs) -> Self {
        BackupSettings {
            connection: args.connection.into(),
            zip_password: args.zip_password,
            backup_dir: args.backup_dir,
            max_backups: args.max_backups,
        }
    }
}

impl From<RestoreArgs> for RestoreSettings {
    fn from(args: RestoreArgs) -> Self {
        RestoreSettings {
            connection: args.connection.into(),
            sql_file: args.sql_file,
        }
    }
}

impl From<ListArgs> for ListSettings {
    fn from(args: ListArgs) -> Self {
        ListSettings {
            db_type: args.db_type,
            db_name: args.db_name,
            backup_dir: args.backup_dir,
        }
    }
}
