pub mod lock;
pub mod process;

use std::path::PathBuf;
use which::which;

use crate::errors::ProcessError;

/// Finds an executable (pg_dump, psql, mysqldump, mysql, zip) in the system PATH.
pub fn find_executable(program: &str) -> Result<PathBuf, ProcessError> {
    which(program).map_err(|source| ProcessError::NotFound {
        program: program.to_string(),
        source,
    })
}
