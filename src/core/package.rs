//! Bundle packaging
//!
//! Turns the destination tree into `<package>-<version>.tgz`:
//! 1. install the platform setup script as `setup.sh`
//! 2. read the package name and version from the generated Makefile
//! 3. relocate dynamic library references (Darwin)
//! 4. strip symbols
//! 5. tar the tree under its versioned name

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::defaults;
use crate::core::build_env::BuildEnvironment;
use crate::core::platform::Platform;
use crate::core::relocate::{self, RewriteReport};
use crate::core::settings::BuildConfig;
use crate::core::strip;
use crate::error::{ArchiveError, BundleError};
use crate::infra::filesystem;
use crate::infra::process::CommandRunner;

/// Package name and version of the built project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    /// Package name (e.g., "cencalvm")
    pub name: String,
    /// Package version (e.g., "0.7.0")
    pub version: String,
}

impl PackageManifest {
    /// Parse the `PACKAGE` and `VERSION` assignments of a generated Makefile
    pub fn parse(content: &str, path: &Path) -> Result<Self, ArchiveError> {
        Ok(Self {
            name: makefile_variable(content, path, "PACKAGE")?,
            version: makefile_variable(content, path, "VERSION")?,
        })
    }

    /// Load from a Makefile on disk
    pub fn load(path: &Path) -> Result<Self, ArchiveError> {
        let content = filesystem::read_file(path).map_err(|e| ArchiveError::Manifest {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Name of the tree inside the archive
    pub fn base_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Archive file name
    pub fn archive_name(&self) -> String {
        format!("{}.tgz", self.base_name())
    }
}

/// Value of a top-level `NAME = value` assignment
fn makefile_variable(content: &str, path: &Path, variable: &str) -> Result<String, ArchiveError> {
    let re = Regex::new(&format!(r"(?m)^{variable}\s*=[ \t]*(\S*)")).map_err(|e| {
        ArchiveError::Manifest {
            path: path.to_path_buf(),
            error: format!("Invalid pattern: {e}"),
        }
    })?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ArchiveError::MissingVariable {
            path: path.to_path_buf(),
            variable: variable.to_string(),
        })
}

/// A directory renamed for the lifetime of the guard
///
/// The original name is restored by [`RenamedTree::restore`] or, failing
/// that, when the guard is dropped.
#[derive(Debug)]
pub struct RenamedTree {
    original: PathBuf,
    renamed: PathBuf,
    restored: bool,
}

impl RenamedTree {
    /// Rename `original` to `renamed`
    pub fn rename(original: &Path, renamed: &Path) -> Result<Self, ArchiveError> {
        std::fs::rename(original, renamed).map_err(|e| ArchiveError::Rename {
            from: original.to_path_buf(),
            to: renamed.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::debug!("Renamed {} to {}", original.display(), renamed.display());
        Ok(Self {
            original: original.to_path_buf(),
            renamed: renamed.to_path_buf(),
            restored: false,
        })
    }

    /// Current location of the tree
    pub fn path(&self) -> &Path {
        &self.renamed
    }

    /// Move the tree back, reporting failure
    pub fn restore(mut self) -> Result<(), ArchiveError> {
        self.restored = true;
        std::fs::rename(&self.renamed, &self.original).map_err(|e| ArchiveError::Rename {
            from: self.renamed.clone(),
            to: self.original.clone(),
            error: e.to_string(),
        })
    }
}

impl Drop for RenamedTree {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = std::fs::rename(&self.renamed, &self.original) {
            tracing::error!(
                "Failed to rename {} back to {}: {e}",
                self.renamed.display(),
                self.original.display()
            );
        }
    }
}

/// What a packaging run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    /// Path of the created archive
    pub archive: PathBuf,
    /// Number of stripped files
    pub stripped: usize,
    /// Relocation summary (Darwin only)
    pub relocated: Option<RewriteReport>,
}

/// Packages the destination tree
#[derive(Debug)]
pub struct Packager<'a> {
    config: &'a BuildConfig,
    platform: &'a Platform,
    env: &'a BuildEnvironment,
}

impl<'a> Packager<'a> {
    /// Create a packager
    pub fn new(config: &'a BuildConfig, platform: &'a Platform, env: &'a BuildEnvironment) -> Self {
        Self {
            config,
            platform,
            env,
        }
    }

    /// Generated Makefile holding the package metadata
    pub fn makefile(&self) -> PathBuf {
        self.config
            .build_dir()
            .join(defaults::TARGET_BUILD_DIR_NAME)
            .join("Makefile")
    }

    /// Copy `setup_<os>.sh` to `dest/setup.sh`
    pub fn install_setup_script(&self) -> Result<PathBuf, ArchiveError> {
        let script = self
            .config
            .source_dir()
            .join(self.platform.os.setup_script());
        let target = self.config.dest_dir().join("setup.sh");
        filesystem::copy_file(&script, &target).map_err(|e| ArchiveError::SetupScript {
            path: script.clone(),
            error: e.to_string(),
        })?;
        tracing::info!("Installed {}", target.display());
        Ok(target)
    }

    /// Where the archive is written
    pub fn archive_path(&self, manifest: &PackageManifest) -> PathBuf {
        self.config.source_dir().join(manifest.archive_name())
    }

    /// Tar the destination tree under its versioned name
    ///
    /// The tree is renamed only while `tar` runs.
    pub fn create_archive(
        &self,
        manifest: &PackageManifest,
        runner: &dyn CommandRunner,
    ) -> Result<PathBuf, ArchiveError> {
        let dest = self.config.dest_dir();
        let parent = dest.parent().ok_or_else(|| ArchiveError::InvalidTree {
            path: dest.to_path_buf(),
        })?;
        let base = manifest.base_name();
        let archive = self.archive_path(manifest);

        let tree = RenamedTree::rename(dest, &parent.join(&base))?;
        let invocation = self.env.command("tar", parent).args([
            "-zcf".to_string(),
            archive.display().to_string(),
            format!("--exclude={base}/lib/*.a"),
            format!("--exclude={base}/lib/*.la"),
            base.clone(),
        ]);
        tracing::info!("Creating {}", archive.display());
        runner.run(&invocation)?;
        tree.restore()?;

        Ok(archive)
    }

    /// Run every packaging step
    pub fn run(&self, runner: &dyn CommandRunner) -> Result<PackageReport, BundleError> {
        self.install_setup_script()?;
        let manifest = PackageManifest::load(&self.makefile())?;
        tracing::info!("Packaging {} {}", manifest.name, manifest.version);

        let relocated = if self.platform.os.rewrites_links() {
            Some(relocate::rewrite_bundle(
                self.config.dest_dir(),
                self.env,
                runner,
            )?)
        } else {
            None
        };

        let stripped =
            strip::strip_tree(self.config.dest_dir(), self.platform.os, self.env, runner)?;
        let archive = self.create_archive(&manifest, runner)?;

        Ok(PackageReport {
            archive,
            stripped,
            relocated,
        })
    }
}
