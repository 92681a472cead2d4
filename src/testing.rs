//! Test doubles shared by the unit tests.

use std::cell::RefCell;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::ConnectionConfig;
use crate::engine::Engine;
use crate::errors::ProcessError;
use crate::utils::process::{CommandSpec, ProcessOutput, ProcessRunner};

/// Records every invocation instead of spawning anything. Mimics the file
/// effects of the real tools: stdout redirection creates the target file,
/// and a successful `zip` writes its output archive.
#[derive(Default)]
pub struct FakeRunner {
    calls: RefCell<Vec<CommandSpec>>,
    failing_programs: Vec<&'static str>,
    failing_calls: Vec<usize>,
    missing_programs: Vec<&'static str>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call to `program` exits with status 1.
    pub fn fail_on(mut self, program: &'static str) -> Self {
        self.failing_programs.push(program);
        self
    }

    /// The `index`-th call (zero based) exits with status 1.
    pub fn fail_nth(mut self, index: usize) -> Self {
        self.failing_calls.push(index);
        self
    }

    /// Calls to `program` fail to spawn.
    pub fn missing(mut self, program: &'static str) -> Self {
        self.missing_programs.push(program);
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.program().to_string()).collect()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        let index = self.call_count();
        self.calls.borrow_mut().push(command.clone());
        let program = command.program();

        if self.missing_programs.iter().any(|p| *p == program) {
            return Err(ProcessError::Spawn {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "simulated missing tool"),
            });
        }

        if let Some(path) = command.stdout() {
            fs::write(path, "-- simulated dump\n").expect("write simulated stdout");
        }

        if self.failing_programs.iter().any(|p| *p == program) || self.failing_calls.contains(&index) {
            return Ok(ProcessOutput {
                code: Some(1),
                stderr: format!("simulated {program} failure"),
            });
        }

        if program == "zip" {
            let args = command.args();
            let output_zip = &args[args.len() - 2];
            fs::write(output_zip, b"PK\x05\x06").expect("write simulated archive");
        }

        Ok(ProcessOutput {
            code: Some(0),
            stderr: String::new(),
        })
    }
}

pub fn argv(command: &CommandSpec) -> Vec<String> {
    command
        .args()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

pub fn connection(engine: Engine) -> ConnectionConfig {
    ConnectionConfig {
        engine,
        database: "shop".to_string(),
        user: "app".to_string(),
        password: "s3cret".to_string(),
        host: "db.local".to_string(),
        port: 6000,
    }
}

/// Creates `name` in `dir` with a modification time `age_secs` in the past.
pub fn touch_archive(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
    path
}

/// File names in `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
