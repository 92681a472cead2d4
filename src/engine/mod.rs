//! Per-engine command construction.
//!
//! Every engine contributes one `EngineCommands` implementation; `Engine::commands`
//! is the only dispatch point, so adding an engine means one variant plus
//! three builder functions.

mod mysql;
mod postgres;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::ConnectionConfig;
use crate::errors::ConfigError;
use crate::utils::process::CommandSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    Postgres,
    Mysql,
}

impl Engine {
    /// Name used on the command line and inside archive file names.
    pub fn name(self) -> &'static str {
        match self {
            Engine::Postgres => "postgres",
            Engine::Mysql => "mysql",
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Engine::Postgres => 5432,
            Engine::Mysql => 3306,
        }
    }

    pub fn commands(self) -> &'static dyn EngineCommands {
        match self {
            Engine::Postgres => &postgres::PostgresCommands,
            Engine::Mysql => &mysql::MysqlCommands,
        }
    }
}

impl FromStr for Engine {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Engine::Postgres),
            "mysql" => Ok(Engine::Mysql),
            _ => Err(ConfigError::UnsupportedEngine(s.to_string())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait EngineCommands: Sync {
    /// Dump `conn.database` with the engine's dump tool, stdout going to `output`.
    fn dump(&self, conn: &ConnectionConfig, output: &Path) -> CommandSpec;

    fn create_database(&self, conn: &ConnectionConfig) -> CommandSpec;

    /// Feed `sql_file` into the engine's client against an existing database.
    fn restore(&self, conn: &ConnectionConfig, sql_file: &Path) -> CommandSpec;
}

pub fn build_dump_command(conn: &ConnectionConfig, output: &Path) -> CommandSpec {
    conn.engine.commands().dump(conn, output)
}

pub fn build_create_database_command(conn: &ConnectionConfig) -> CommandSpec {
    conn.engine.commands().create_database(conn)
}

pub fn build_restore_command(conn: &ConnectionConfig, sql_file: &Path) -> CommandSpec {
    conn.engine.commands().restore(conn, sql_file)
}
