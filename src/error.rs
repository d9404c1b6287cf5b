//! Error types for cencalvm-bundle
//!
//! Domain-specific error types using thiserror. Every error is fatal for the
//! run: nothing here is retried or recovered locally.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::dependency::BuildPhase;

/// Subprocess errors
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The program could not be started
    #[error("Failed to start '{program}' in '{cwd}': {error}")]
    Spawn {
        program: String,
        cwd: PathBuf,
        error: String,
    },

    /// The program ran and exited unsuccessfully
    #[error("Command '{command}' failed in '{cwd}' ({status})")]
    Failed {
        command: String,
        cwd: PathBuf,
        status: String,
    },

    /// A required tool is not on the build PATH
    #[error("Required tool '{tool}' not found on the build PATH")]
    ToolNotFound { tool: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file does not exist
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// A dependency section is missing
    #[error("Config file has no [{section}] section")]
    MissingSection { section: String },

    /// A directory could not be resolved to an absolute path
    #[error("Invalid directory '{path}': {error}")]
    InvalidPath { path: PathBuf, error: String },

    /// Dependencies requested without a loaded config file
    #[error("No dependency configuration loaded")]
    NotLoaded,

    /// Thread count of zero
    #[error("Number of make threads must be greater than 0")]
    ZeroThreads,
}

/// Platform errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Host OS is neither Linux nor Darwin
    #[error("Unsupported platform '{os}' ({arch}). Only Linux and Darwin are supported")]
    Unsupported { os: String, arch: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network error
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// Server answered with a non-success status
    #[error("Download of '{url}' failed with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Checksum verification failed
    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Archive extraction errors
#[derive(Error, Debug)]
pub enum UnpackError {
    /// tar exited unsuccessfully
    #[error("Failed to extract '{archive}'")]
    Extract {
        archive: PathBuf,
        #[source]
        source: ProcessError,
    },

    /// Directory alias could not be created
    #[error("Failed to alias '{link}' to '{target}': {error}")]
    Alias {
        link: PathBuf,
        target: String,
        error: String,
    },
}

/// A single build or install step failed
#[derive(Error, Debug)]
pub enum StepError {
    /// Subprocess failure
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Filesystem failure
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// A build step failed
    #[error("Build failed for '{package}'")]
    StepFailed {
        package: String,
        #[source]
        source: StepError,
    },
}

/// Install errors
#[derive(Error, Debug)]
pub enum InstallError {
    /// An install step failed
    #[error("Install failed for '{package}'")]
    StepFailed {
        package: String,
        #[source]
        source: StepError,
    },
}

/// Errors raised while driving one dependency through its lifecycle
#[derive(Error, Debug)]
pub enum DependencyError {
    /// Operation requested from the wrong phase
    #[error("Cannot {operation} '{package}' while it is {phase}")]
    PhaseOrder {
        package: String,
        operation: &'static str,
        phase: BuildPhase,
    },

    /// Download error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Extraction error
    #[error(transparent)]
    Unpack(#[from] UnpackError),

    /// Build error
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Install error
    #[error(transparent)]
    Install(#[from] InstallError),
}

/// Symbol stripping errors
#[derive(Error, Debug)]
pub enum StripError {
    /// Invalid glob pattern
    #[error("Invalid strip pattern '{pattern}': {error}")]
    Pattern { pattern: String, error: String },

    /// strip exited unsuccessfully
    #[error("Failed to strip symbols")]
    Process(#[from] ProcessError),
}

/// Archive assembly errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Build metadata could not be read
    #[error("Failed to read package metadata from '{path}': {error}")]
    Manifest { path: PathBuf, error: String },

    /// Build metadata lacks a variable
    #[error("Package metadata '{path}' does not define {variable}")]
    MissingVariable { path: PathBuf, variable: String },

    /// Destination tree has no usable name or parent
    #[error("Destination tree '{path}' has no parent directory or name")]
    InvalidTree { path: PathBuf },

    /// Directory rename failed
    #[error("Failed to rename '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Setup script could not be installed
    #[error("Failed to copy setup script '{path}': {error}")]
    SetupScript { path: PathBuf, error: String },

    /// tar exited unsuccessfully
    #[error("Failed to create archive")]
    Process(#[from] ProcessError),
}

/// Dynamic library reference rewriting errors
#[derive(Error, Debug)]
pub enum RewriteError {
    /// Directory scan failed
    #[error("Failed to scan '{path}': {error}")]
    Scan { path: PathBuf, error: String },

    /// otool failed on a binary
    #[error("Failed to list dynamic libraries of '{binary}'")]
    Inspect {
        binary: PathBuf,
        #[source]
        source: ProcessError,
    },

    /// install_name_tool failed on a reference
    #[error("Failed to rewrite '{reference}' in '{binary}'")]
    Change {
        binary: PathBuf,
        reference: String,
        #[source]
        source: ProcessError,
    },

    /// Some binaries could not be rewritten
    #[error("Dynamic library references could not be rewritten in: {}", join_paths(failed))]
    Incomplete { failed: Vec<PathBuf> },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Top-level bundle error type
#[derive(Error, Debug)]
pub enum BundleError {
    /// Config error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Platform error
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Missing tool
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Dependency pipeline error
    #[error("Dependency '{package}' failed")]
    Dependency {
        package: String,
        #[source]
        source: DependencyError,
    },

    /// Target build error
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Target install error
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Strip error
    #[error(transparent)]
    Strip(#[from] StripError),

    /// Archive error
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Rewrite error
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
