//! Build environment setup
//!
//! Computes the PATH and library search path handed to every subprocess.
//! The values are attached to each [`Invocation`] instead of being written
//! into the environment of the running process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::platform::{OsFamily, Platform};
use crate::core::settings::BuildConfig;
use crate::infra::process::Invocation;

/// System directories appended to the build PATH
const SYSTEM_PATH: &[&str] = &["/bin", "/usr/bin", "/sbin", "/usr/sbin"];

/// Environment shared by every subprocess of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    /// Executable search path, in order
    pub path: Vec<PathBuf>,
    /// Shared library search path (Linux only)
    pub library_path: Vec<PathBuf>,
    /// Additional environment variables
    pub extra_env: BTreeMap<String, String>,
}

impl BuildEnvironment {
    /// Environment for building into `config`'s destination tree
    ///
    /// The destination `bin` comes first so freshly installed tools (the gcc
    /// toolchain on Linux) win over system ones; `$HOME/bin` follows for
    /// locally installed build utilities.
    pub fn new(config: &BuildConfig, platform: &Platform) -> Self {
        Self::with_home(config, platform, dirs::home_dir().as_deref())
    }

    /// Same as [`BuildEnvironment::new`] with an explicit home directory
    pub fn with_home(config: &BuildConfig, platform: &Platform, home: Option<&Path>) -> Self {
        let dest = config.dest_dir();

        let mut path = vec![dest.join("bin")];
        if let Some(home) = home {
            path.push(home.join("bin"));
        }
        path.extend(SYSTEM_PATH.iter().map(PathBuf::from));

        let library_path = match platform.os {
            OsFamily::Linux => {
                let mut dirs = vec![dest.join("lib")];
                if platform.uses_lib64() {
                    dirs.push(dest.join("lib64"));
                }
                dirs
            }
            OsFamily::Darwin => Vec::new(),
        };

        Self {
            path,
            library_path,
            extra_env: BTreeMap::new(),
        }
    }

    /// Add an extra environment variable
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.extra_env.insert(key.to_string(), value.to_string());
        self
    }

    /// PATH value
    pub fn path_var(&self) -> String {
        join_paths(&self.path)
    }

    /// Convert to environment variable map for process execution
    pub fn to_env_map(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), self.path_var());
        if !self.library_path.is_empty() {
            env.insert(
                "LD_LIBRARY_PATH".to_string(),
                join_paths(&self.library_path),
            );
        }
        for (key, value) in &self.extra_env {
            env.insert(key.clone(), value.clone());
        }
        env
    }

    /// Start an invocation of `program` in `cwd` carrying this environment
    pub fn command(&self, program: impl Into<String>, cwd: impl Into<PathBuf>) -> Invocation {
        Invocation::new(program, cwd).envs(&self.to_env_map())
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":")
}
