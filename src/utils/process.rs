// dbbackup/src/utils/process.rs
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use super::find_executable;
use crate::errors::{ProcessError, StepFailure};

const MASK: &str = "******";

/// A fully described external invocation: argument vector, environment
/// bindings and optional stdin/stdout redirections. Nothing goes through a shell.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<OsString>,
    secret_args: Vec<usize>,
    env: Vec<(String, String)>,
    stdin: Option<PathBuf>,
    stdout: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            secret_args: Vec::new(),
            env: Vec::new(),
            stdin: None,
            stdout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Like `arg`, but masked whenever the command is displayed.
    pub fn secret_arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.secret_args.push(self.args.len());
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn stdin(&self) -> Option<&Path> {
        self.stdin.as_deref()
    }

    pub fn stdout(&self) -> Option<&Path> {
        self.stdout.as_deref()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, _) in &self.env {
            write!(f, "{}={} ", key, MASK)?;
        }
        f.write_str(&self.program)?;
        for (i, arg) in self.args.iter().enumerate() {
            if self.secret_args.contains(&i) {
                write!(f, " {}", MASK)?;
            } else {
                write!(f, " {}", arg.to_string_lossy())?;
            }
        }
        if let Some(path) = &self.stdin {
            write!(f, " < {}", path.display())?;
        }
        if let Some(path) = &self.stdout {
            write!(f, " > {}", path.display())?;
        }
        Ok(())
    }
}

// Debug goes through Display so credentials never reach logs or test output.
impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandSpec({})", self)
    }
}

/// Result of a process that was started and waited on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => code.to_string(),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Executes one external command to completion.
pub trait ProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError>;
}

/// Runs commands on the host, resolving the program through PATH.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        let program = command.program();
        let executable = find_executable(program)?;
        debug!(program, path = %executable.display(), "Resolved executable");

        let mut cmd = Command::new(&executable);
        cmd.args(command.args())
            .envs(command.envs().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stderr(Stdio::piped());

        if let Some(path) = command.stdin() {
            let file = File::open(path).map_err(|source| ProcessError::Redirect {
                program: program.to_string(),
                path: path.to_path_buf(),
                source,
            })?;
            cmd.stdin(Stdio::from(file));
        }
        if let Some(path) = command.stdout() {
            let file = File::create(path).map_err(|source| ProcessError::Redirect {
                program: program.to_string(),
                path: path.to_path_buf(),
                source,
            })?;
            cmd.stdout(Stdio::from(file));
        } else {
            cmd.stdout(Stdio::null());
        }

        let output = cmd.output().map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Runs `command` and turns a non-zero exit into a `StepFailure`.
pub fn run_checked(runner: &dyn ProcessRunner, command: &CommandSpec) -> Result<(), StepFailure> {
    debug!(command = %command, "Running external command");
    let output = runner.run(command)?;
    if output.success() {
        Ok(())
    } else {
        Err(StepFailure::Exit {
            program: command.program().to_string(),
            status: output.status_text(),
            stderr: output.stderr,
        })
    }
}
