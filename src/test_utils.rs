//! Test utilities
//!
//! Provides a [`CommandRunner`] that records invocations instead of running
//! them, plus proptest generators.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::ProcessError;
use crate::infra::process::{CommandOutput, CommandRunner, Invocation};

type FailPredicate = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// Runner that records every invocation and succeeds unless told otherwise
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    fail_when: Option<FailPredicate>,
    stdout: HashMap<String, String>,
}

impl RecordingRunner {
    /// Runner where every invocation succeeds
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: None,
            stdout: HashMap::new(),
        }
    }

    /// Runner where invocations matching `predicate` fail
    pub fn failing_on(predicate: impl Fn(&Invocation) -> bool + Send + Sync + 'static) -> Self {
        Self {
            fail_when: Some(Box::new(predicate)),
            ..Self::new()
        }
    }

    /// Return `stdout` for invocations whose command line starts with `prefix`
    #[must_use]
    pub fn with_stdout(mut self, prefix: &str, stdout: &str) -> Self {
        self.stdout.insert(prefix.to_string(), stdout.to_string());
        self
    }

    /// Recorded invocations, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded command lines, in order
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::command_line).collect()
    }
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        self.calls.lock().unwrap().push(invocation.clone());

        if self.fail_when.as_ref().is_some_and(|f| f(invocation)) {
            return Err(ProcessError::Failed {
                command: invocation.command_line(),
                cwd: invocation.cwd.clone(),
                status: "exit status: 2".to_string(),
            });
        }

        let line = invocation.command_line();
        let stdout = self
            .stdout
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(CommandOutput { stdout })
    }
}

pub mod generators {
    use proptest::prelude::*;

    /// Generate a library base name (e.g., "libproj")
    pub fn library_name() -> impl Strategy<Value = String> {
        "lib[a-z][a-z0-9]{0,12}"
    }

    /// Generate a version-ish suffix (e.g., ".12.0")
    pub fn version_suffix() -> impl Strategy<Value = String> {
        prop::collection::vec(0u32..30, 0..3)
            .prop_map(|parts| parts.iter().map(|p| format!(".{p}")).collect())
    }

    /// Generate a non-system absolute directory
    pub fn install_dir() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("/opt/local/lib".to_string()),
            Just("/Users/builder/cencalvm-binary/dist/lib".to_string()),
            "/[a-tv-z][a-z]{1,8}(/[a-z]{1,8}){0,3}",
        ]
    }
}
