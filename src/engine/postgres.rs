use std::path::Path;

use super::EngineCommands;
use crate::config::ConnectionConfig;
use crate::utils::process::CommandSpec;

pub struct PostgresCommands;

impl PostgresCommands {
    /// psql/pg_dump read the password from PGPASSWORD rather than argv.
    fn client(program: &str, conn: &ConnectionConfig) -> CommandSpec {
        CommandSpec::new(program)
            .env("PGPASSWORD", conn.password.as_str())
            .arg("-U")
            .arg(&conn.user)
            .arg("-h")
            .arg(&conn.host)
            .arg("-p")
            .arg(conn.port.to_string())
    }
}

impl EngineCommands for PostgresCommands {
    fn dump(&self, conn: &ConnectionConfig, output: &Path) -> CommandSpec {
        Self::client("pg_dump", conn)
            .arg("-d")
            .arg(&conn.database)
            .stdout_to(output)
    }

    // No IF NOT EXISTS in postgres: this fails when the database is already there.
    fn create_database(&self, conn: &ConnectionConfig) -> CommandSpec {
        Self::client("psql", conn).arg("-c").arg(format!(
            "CREATE DATABASE \"{}\";",
            conn.database.replace('"', "\"\"")
        ))
    }

    fn restore(&self, conn: &ConnectionConfig, sql_file: &Path) -> CommandSpec {
        Self::client("psql", conn)
            .arg("-d")
            .arg(&conn.database)
            .arg("-f")
            .arg(sql_file)
    }
}
