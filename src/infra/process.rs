//! External process execution
//!
//! Every subprocess is described by an [`Invocation`] that carries its own
//! working directory and environment. Nothing here changes the working
//! directory or environment of the running process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::ProcessError;

/// A fully specified subprocess call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory for the child
    pub cwd: PathBuf,
    /// Variables set in the child on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Capture stdout instead of passing it through
    pub capture: bool,
}

impl Invocation {
    /// Create an invocation of `program` running in `cwd`
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: BTreeMap::new(),
            capture: false,
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set one environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set several environment variables
    #[must_use]
    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Capture stdout
    #[must_use]
    pub fn capturing(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Command line as it would be typed in a shell
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured stdout (empty unless the invocation asked for capture)
    pub stdout: String,
}

/// Runs subprocesses to completion, one at a time
pub trait CommandRunner: Send + Sync {
    /// Run the invocation and wait for it to exit
    ///
    /// A non-zero exit status is an error.
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError>;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        tracing::info!("Running '{}'...", invocation.command_line());
        tracing::debug!("  in {}", invocation.cwd.display());

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(&invocation.env)
            .stdin(Stdio::null());

        let spawn_error = |e: std::io::Error| ProcessError::Spawn {
            program: invocation.program.clone(),
            cwd: invocation.cwd.clone(),
            error: e.to_string(),
        };

        let (status, stdout) = if invocation.capture {
            let output = cmd.output().map_err(spawn_error)?;
            (
                output.status,
                String::from_utf8_lossy(&output.stdout).into_owned(),
            )
        } else {
            (cmd.status().map_err(spawn_error)?, String::new())
        };

        if !status.success() {
            return Err(ProcessError::Failed {
                command: invocation.command_line(),
                cwd: invocation.cwd.clone(),
                status: status.to_string(),
            });
        }

        Ok(CommandOutput { stdout })
    }
}

/// Check that every tool is reachable through `search_path`
pub fn require_tools(tools: &[&str], search_path: &str, cwd: &Path) -> Result<(), ProcessError> {
    for tool in tools {
        if which::which_in(tool, Some(search_path), cwd).is_err() {
            return Err(ProcessError::ToolNotFound {
                tool: (*tool).to_string(),
            });
        }
        tracing::debug!("Found required tool '{tool}'");
    }
    Ok(())
}
