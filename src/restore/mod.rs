mod logic;

use crate::config::{RestoreConfig, RestoreSettings};
use crate::errors::RestoreError;
use crate::utils::process::ProcessRunner;
pub use logic::RestoreReport;

/// Public entry point for the restore process.
pub fn run_restore_flow(
    settings: RestoreSettings,
    runner: &dyn ProcessRunner,
) -> Result<RestoreReport, RestoreError> {
    let config = RestoreConfig::resolve(settings)?;
    logic::perform_restore_orchestration(&config, runner)
}
