use std::path::Path;

use super::EngineCommands;
use crate::config::ConnectionConfig;
use crate::utils::process::CommandSpec;

pub struct MysqlCommands;

impl MysqlCommands {
    fn client(program: &str, conn: &ConnectionConfig) -> CommandSpec {
        CommandSpec::new(program)
            .arg("-u")
            .arg(&conn.user)
            .secret_arg(format!("-p{}", conn.password))
            .arg("-h")
            .arg(&conn.host)
            .arg("-P")
            .arg(conn.port.to_string())
    }
}

impl EngineCommands for MysqlCommands {
    fn dump(&self, conn: &ConnectionConfig, output: &Path) -> CommandSpec {
        Self::client("mysqldump", conn)
            .arg(&conn.database)
            .stdout_to(output)
    }

    fn create_database(&self, conn: &ConnectionConfig) -> CommandSpec {
        Self::client("mysql", conn).arg("-e").arg(format!(
            "CREATE DATABASE IF NOT EXISTS `{}`;",
            conn.database.replace('`', "``")
        ))
    }

    fn restore(&self, conn: &ConnectionConfig, sql_file: &Path) -> CommandSpec {
        Self::client("mysql", conn)
            .arg(&conn.database)
            .stdin_from(sql_file)
    }
}
