//! Dependency pipeline
//!
//! Builds the selected dependencies in a fixed order: gcc, euclid, proj.
//! The first failure aborts the run; nothing after it starts and nothing is
//! cleaned up.

use std::fmt;

use crate::core::build_env::BuildEnvironment;
use crate::core::config::BundleConfig;
use crate::core::dependency::DependencyBuilder;
use crate::core::platform::{OsFamily, Platform};
use crate::core::recipe::Recipe;
use crate::core::recipes;
use crate::core::settings::BuildConfig;
use crate::error::{BundleError, ConfigError};
use crate::infra::download::Fetcher;
use crate::infra::process::CommandRunner;

/// Pipeline stages, in build order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// gcc and its sub-libraries
    Toolchain,
    /// euclid
    CustomLibrary,
    /// proj
    ProjectionLibrary,
}

impl Stage {
    /// Every stage, in build order
    pub const ORDER: [Stage; 3] = [
        Stage::Toolchain,
        Stage::CustomLibrary,
        Stage::ProjectionLibrary,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toolchain => write!(f, "gcc"),
            Self::CustomLibrary => write!(f, "euclid"),
            Self::ProjectionLibrary => write!(f, "proj"),
        }
    }
}

/// Which stages to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Build gcc
    pub toolchain: bool,
    /// Build euclid
    pub custom_library: bool,
    /// Build proj
    pub projection_library: bool,
}

impl Selection {
    /// Default selection for a platform: gcc only where no system compiler is assumed
    pub fn for_platform(os: OsFamily) -> Self {
        Self {
            toolchain: os.builds_toolchain(),
            custom_library: true,
            projection_library: true,
        }
    }

    /// Whether `stage` is selected
    pub fn includes(&self, stage: Stage) -> bool {
        match stage {
            Stage::Toolchain => self.toolchain,
            Stage::CustomLibrary => self.custom_library,
            Stage::ProjectionLibrary => self.projection_library,
        }
    }

    /// Selected stages, in build order
    pub fn stages(&self) -> Vec<Stage> {
        Stage::ORDER
            .into_iter()
            .filter(|stage| self.includes(*stage))
            .collect()
    }
}

/// Ordered list of dependency recipes
#[derive(Debug, Clone)]
pub struct Pipeline {
    recipes: Vec<Recipe>,
}

impl Pipeline {
    /// Build the recipe list for `selection`
    ///
    /// Only the config sections of selected stages are required.
    pub fn plan(
        bundle: &BundleConfig,
        config: &BuildConfig,
        platform: &Platform,
        env: &BuildEnvironment,
        selection: Selection,
    ) -> Result<Self, ConfigError> {
        let recipes = selection
            .stages()
            .into_iter()
            .map(|stage| -> Result<Recipe, ConfigError> {
                Ok(match stage {
                    Stage::Toolchain => recipes::gcc(
                        &bundle.gcc()?,
                        &bundle.gcc_subpackages()?,
                        config,
                        env,
                    ),
                    Stage::CustomLibrary => {
                        recipes::euclid(&bundle.euclid()?, config, platform, env)
                    }
                    Stage::ProjectionLibrary => {
                        let section = bundle.proj_section()?;
                        recipes::proj(
                            &bundle.proj()?,
                            &section.datum_version,
                            section.datum_sha256.as_deref(),
                            config,
                            env,
                        )
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { recipes })
    }

    /// Pipeline over explicit recipes
    pub fn from_recipes(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// Recipes, in build order
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Build every recipe in order, stopping at the first failure
    ///
    /// Returns the names of the installed dependencies.
    pub async fn run(
        &self,
        env: &BuildEnvironment,
        fetcher: &Fetcher,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<String>, BundleError> {
        let mut installed = Vec::with_capacity(self.recipes.len());
        for recipe in &self.recipes {
            let mut builder = DependencyBuilder::new(recipe, env, fetcher, runner);
            builder
                .run()
                .await
                .map_err(|source| BundleError::Dependency {
                    package: recipe.name.clone(),
                    source,
                })?;
            installed.push(recipe.name.clone());
        }
        Ok(installed)
    }
}
