//! Dependency lifecycle
//!
//! Drives one [`Recipe`] through download, unpack, build and install. The
//! phases only move forward; asking for an operation out of order fails
//! without running anything.

use std::fmt;

use crate::core::build_env::BuildEnvironment;
use crate::core::recipe::Recipe;
use crate::error::{BuildError, DependencyError, InstallError};
use crate::infra::archive;
use crate::infra::download::Fetcher;
use crate::infra::process::CommandRunner;

/// Lifecycle phase reached by a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildPhase {
    /// Nothing done yet
    NotStarted,
    /// Archives present in the download directory
    Downloaded,
    /// Archives extracted
    Unpacked,
    /// Build steps completed
    Built,
    /// Install steps completed
    Installed,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Downloaded => write!(f, "downloaded"),
            Self::Unpacked => write!(f, "unpacked"),
            Self::Built => write!(f, "built"),
            Self::Installed => write!(f, "installed"),
        }
    }
}

/// Builds and installs one dependency
pub struct DependencyBuilder<'a> {
    recipe: &'a Recipe,
    env: &'a BuildEnvironment,
    fetcher: &'a Fetcher,
    runner: &'a dyn CommandRunner,
    phase: BuildPhase,
}

impl<'a> DependencyBuilder<'a> {
    /// Create a builder in the `NotStarted` phase
    pub fn new(
        recipe: &'a Recipe,
        env: &'a BuildEnvironment,
        fetcher: &'a Fetcher,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            recipe,
            env,
            fetcher,
            runner,
            phase: BuildPhase::NotStarted,
        }
    }

    /// Current phase
    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Dependency name
    pub fn name(&self) -> &str {
        &self.recipe.name
    }

    fn expect_phase(
        &self,
        expected: BuildPhase,
        operation: &'static str,
    ) -> Result<(), DependencyError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(DependencyError::PhaseOrder {
                package: self.recipe.name.clone(),
                operation,
                phase: self.phase,
            })
        }
    }

    /// Fetch every archive of the recipe
    pub async fn download(&mut self) -> Result<(), DependencyError> {
        self.expect_phase(BuildPhase::NotStarted, "download")?;
        for file in &self.recipe.downloads {
            self.fetcher
                .fetch(
                    &file.base_url,
                    &file.filename,
                    &self.recipe.download_dir,
                    file.sha256.as_deref(),
                )
                .await?;
        }
        self.phase = BuildPhase::Downloaded;
        Ok(())
    }

    /// Extract archives and create directory aliases
    pub fn unpack(&mut self) -> Result<(), DependencyError> {
        self.expect_phase(BuildPhase::Downloaded, "unpack")?;
        for extraction in &self.recipe.extractions {
            archive::unpack(self.runner, self.env, &extraction.archive, &extraction.into)?;
            if let Some(alias) = &extraction.alias {
                archive::alias_directory(&extraction.into, &alias.canonical, &alias.versioned)?;
            }
        }
        self.phase = BuildPhase::Unpacked;
        Ok(())
    }

    /// Run the build steps
    pub fn build(&mut self) -> Result<(), DependencyError> {
        self.expect_phase(BuildPhase::Unpacked, "build")?;
        for step in &self.recipe.build {
            tracing::debug!("[{}] {step}", self.recipe.name);
            step.execute(self.runner)
                .map_err(|source| BuildError::StepFailed {
                    package: self.recipe.name.clone(),
                    source,
                })?;
        }
        self.phase = BuildPhase::Built;
        Ok(())
    }

    /// Run the install steps
    pub fn install(&mut self) -> Result<(), DependencyError> {
        self.expect_phase(BuildPhase::Built, "install")?;
        for step in &self.recipe.install {
            tracing::debug!("[{}] {step}", self.recipe.name);
            step.execute(self.runner)
                .map_err(|source| InstallError::StepFailed {
                    package: self.recipe.name.clone(),
                    source,
                })?;
        }
        self.phase = BuildPhase::Installed;
        Ok(())
    }

    /// Run all four phases in order
    pub async fn run(&mut self) -> Result<(), DependencyError> {
        tracing::info!("Building dependency '{}'", self.recipe.name);
        self.download().await?;
        self.unpack()?;
        self.build()?;
        self.install()?;
        tracing::info!("Installed dependency '{}'", self.recipe.name);
        Ok(())
    }
}
