//! Data-driven dependency recipes
//!
//! A [`Recipe`] lists what one dependency needs in each lifecycle phase:
//! files to fetch, archives to extract, and the build and install steps.
//! The same [`DependencyBuilder`](crate::core::dependency::DependencyBuilder)
//! drives every recipe.

use std::fmt;
use std::path::PathBuf;

use crate::error::StepError;
use crate::infra::filesystem;
use crate::infra::process::{CommandRunner, Invocation};

/// A file fetched from a base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Base URL
    pub base_url: String,
    /// File name, appended to the base URL and used locally
    pub filename: String,
    /// Optional SHA256
    pub sha256: Option<String>,
}

/// Fixed-name symlink created next to an extracted directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Name the build scripts expect (e.g., "mpc")
    pub canonical: String,
    /// Directory the archive extracted to (e.g., "mpc-1.0.3")
    pub versioned: String,
}

/// One archive extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Archive to extract
    pub archive: PathBuf,
    /// Directory extracted into
    pub into: PathBuf,
    /// Optional alias created in `into` afterwards
    pub alias: Option<Alias>,
}

/// One build or install step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Create a directory if missing
    CreateDir(PathBuf),
    /// Copy a file, replacing the destination
    CopyFile {
        /// Source
        from: PathBuf,
        /// Destination
        to: PathBuf,
    },
    /// Run a subprocess
    Run(Invocation),
}

impl Step {
    /// Execute the step
    pub fn execute(&self, runner: &dyn CommandRunner) -> Result<(), StepError> {
        match self {
            Self::CreateDir(path) => filesystem::create_dir_all(path)?,
            Self::CopyFile { from, to } => filesystem::copy_file(from, to)?,
            Self::Run(invocation) => {
                runner.run(invocation)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir(path) => write!(f, "mkdir -p {}", path.display()),
            Self::CopyFile { from, to } => write!(f, "cp {} {}", from.display(), to.display()),
            Self::Run(invocation) => write!(f, "{}", invocation.command_line()),
        }
    }
}

/// Everything needed to take one dependency from nothing to installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Dependency name
    pub name: String,
    /// Directory archives are fetched into
    pub download_dir: PathBuf,
    /// Files fetched in the download phase
    pub downloads: Vec<RemoteFile>,
    /// Extractions performed in the unpack phase
    pub extractions: Vec<Extraction>,
    /// Build phase steps
    pub build: Vec<Step>,
    /// Install phase steps
    pub install: Vec<Step>,
}
