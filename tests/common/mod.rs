//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use cencalvm_bundle::error::ProcessError;
use cencalvm_bundle::infra::process::{CommandOutput, CommandRunner, Invocation};
use tempfile::TempDir;

/// Test project context
///
/// Lays out a support directory (`packager/`) the way a cencalvm checkout
/// does, next to a base directory for the build and destination trees.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.create_file("packager/setup_linux.sh", "export PATH=$PWD/bin:$PATH\n");
        project.create_file("packager/setup_darwin.sh", "export PATH=$PWD/bin:$PATH\n");
        project.create_file("packager/makefile_euclid_linux", "all:\n");
        project.create_file("packager/makefile_euclid_darwin", "all:\n");
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Support directory
    pub fn source_dir(&self) -> PathBuf {
        self.dir.path().join("packager")
    }

    /// Base directory for build and destination trees
    pub fn base_dir(&self) -> PathBuf {
        self.dir.path().join("base")
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Run the binary with `args` from the project directory
    pub fn run(&self, args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_cencalvm-bundle"))
            .current_dir(self.dir.path())
            .args(args)
            .env_remove("CENCALVM_BASE_DIR")
            .output()
            .expect("Failed to execute cencalvm-bundle")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Dependency configuration pointing at an unreachable host
pub const SAMPLE_CONFIG: &str = r#"
[gcc]
version = "7.3.0"
suffix = "gz"
url = "http://127.0.0.1:9/gcc"

[mpc]
version = "1.0.3"
suffix = "gz"

[gmp]
version = "6.1.2"
suffix = "bz2"

[mpfr]
version = "3.1.6"
suffix = "bz2"

[euclid]
version = "1.3"
suffix = "gz"
url = "http://127.0.0.1:9/euclid"

[proj]
version = "4.9.3"
suffix = "gz"
url = "http://127.0.0.1:9/proj"
datum_version = "1.6"
"#;

/// Archives of [`SAMPLE_CONFIG`], as fetched into the build tree
pub const SAMPLE_ARCHIVES: &[&str] = &[
    "gcc-7.3.0.tar.gz",
    "mpc-1.0.3.tar.gz",
    "gmp-6.1.2.tar.bz2",
    "mpfr-3.1.6.tar.bz2",
    "euclid1.3.tar.gz",
    "proj-4.9.3.tar.gz",
    "proj-datumgrid-1.6.zip",
];

/// Place placeholder archives in `build_dir` so nothing is downloaded
pub fn seed_archives(build_dir: &Path) {
    std::fs::create_dir_all(build_dir).expect("Failed to create build directory");
    for archive in SAMPLE_ARCHIVES {
        std::fs::write(build_dir.join(archive), b"archive").expect("Failed to write archive");
    }
    // Extraction is faked, so create what tar would have produced
    std::fs::create_dir_all(build_dir.join("euclid1.3/libsrc"))
        .expect("Failed to create euclid sources");
    std::fs::create_dir_all(build_dir.join("gcc-7.3.0")).expect("Failed to create gcc sources");
}

type FailPredicate = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// Runner that records invocations instead of running them
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    fail_when: Option<FailPredicate>,
}

impl FakeRunner {
    /// Runner where every invocation succeeds
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: None,
        }
    }

    /// Runner where invocations matching `predicate` fail
    pub fn failing_on(predicate: impl Fn(&Invocation) -> bool + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: Some(Box::new(predicate)),
        }
    }

    /// Recorded invocations, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("Runner lock poisoned").clone()
    }

    /// Working directories of recorded invocations, in order
    pub fn directories(&self) -> Vec<PathBuf> {
        self.calls().into_iter().map(|c| c.cwd).collect()
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        self.calls
            .lock()
            .expect("Runner lock poisoned")
            .push(invocation.clone());
        if self.fail_when.as_ref().is_some_and(|f| f(invocation)) {
            return Err(ProcessError::Failed {
                command: invocation.command_line(),
                cwd: invocation.cwd.clone(),
                status: "exit status: 2".to_string(),
            });
        }
        Ok(CommandOutput::default())
    }
}
