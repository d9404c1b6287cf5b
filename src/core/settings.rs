//! Build directory layout
//!
//! [`BuildConfig`] is created once at startup and shared read-only by every
//! component.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::error::ConfigError;

/// Directories and parallelism for one bundle run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Directory holding setup scripts and euclid makefiles; receives the archive
    source_dir: PathBuf,
    /// Installation prefix for every dependency and cencalvm
    dest_dir: PathBuf,
    /// Scratch tree where archives are fetched and unpacked
    build_dir: PathBuf,
    /// Number of parallel make jobs
    threads: usize,
}

impl BuildConfig {
    /// Create a configuration rooted at `base_dir`
    ///
    /// `~` is expanded and relative paths are resolved against the current
    /// directory, so every stored path is absolute.
    pub fn new(source_dir: &Path, base_dir: &Path, threads: usize) -> Result<Self, ConfigError> {
        if threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        let source_dir = absolute(&expand_home(source_dir))?;
        let base_dir = absolute(&expand_home(base_dir))?;
        Ok(Self {
            source_dir,
            dest_dir: base_dir.join(defaults::DEST_DIR_NAME),
            build_dir: base_dir.join(defaults::BUILD_DIR_NAME),
            threads,
        })
    }

    /// Default base directory (`$HOME/cencalvm-binary`)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(defaults::DEFAULT_BASE_DIR_NAME)
    }

    /// Support file directory
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Top of the cencalvm source tree (parent of the support directory)
    pub fn project_dir(&self) -> PathBuf {
        self.source_dir.join("..")
    }

    /// Destination tree
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Build tree
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Parallel make jobs
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// `make -j<threads>` argument
    pub fn jobs_arg(&self) -> String {
        format!("-j{}", self.threads)
    }

    /// `--prefix=<dest>` argument
    pub fn prefix_arg(&self) -> String {
        format!("--prefix={}", self.dest_dir.display())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| ConfigError::InvalidPath {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
}
