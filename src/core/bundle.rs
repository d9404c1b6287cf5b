//! Bundle run orchestration
//!
//! A run is a subset of four phases executed in a fixed order: setup,
//! dependencies, cencalvm, package. The first failing phase ends the run.

use crate::config::defaults;
use crate::core::build_env::BuildEnvironment;
use crate::core::config::BundleConfig;
use crate::core::package::{PackageReport, Packager};
use crate::core::pipeline::{Pipeline, Selection};
use crate::core::platform::Platform;
use crate::core::settings::BuildConfig;
use crate::core::setup;
use crate::core::target::TargetBuilder;
use crate::error::{BundleError, ConfigError};
use crate::infra::download::Fetcher;
use crate::infra::process::{self, CommandRunner};

/// Phases requested for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Phases {
    /// Recreate the destination and build trees
    pub setup: bool,
    /// Build the dependency pipeline
    pub dependencies: bool,
    /// Build cencalvm
    pub target: bool,
    /// Package the destination tree
    pub package: bool,
}

impl Phases {
    /// Every phase
    pub fn all() -> Self {
        Self {
            setup: true,
            dependencies: true,
            target: true,
            package: true,
        }
    }

    /// Whether no phase is requested
    pub fn is_empty(&self) -> bool {
        !(self.setup || self.dependencies || self.target || self.package)
    }
}

/// What a run accomplished
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleSummary {
    /// Installed dependencies, in build order
    pub dependencies: Vec<String>,
    /// Whether cencalvm was built and installed
    pub target_installed: bool,
    /// Packaging result
    pub package: Option<PackageReport>,
}

/// Everything a run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Bundle {
    config: BuildConfig,
    platform: Platform,
    env: BuildEnvironment,
    dependencies: Option<BundleConfig>,
    selection: Selection,
}

impl Bundle {
    /// Create a bundle with the default environment and dependency selection
    pub fn new(config: BuildConfig, platform: Platform) -> Self {
        let env = BuildEnvironment::new(&config, &platform);
        let selection = Selection::for_platform(platform.os);
        Self {
            config,
            platform,
            env,
            dependencies: None,
            selection,
        }
    }

    /// Replace the subprocess environment
    #[must_use]
    pub fn with_environment(mut self, env: BuildEnvironment) -> Self {
        self.env = env;
        self
    }

    /// Attach the dependency configuration
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: BundleConfig) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    /// Override which dependencies are built
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Directory layout
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Host platform
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Subprocess environment
    pub fn env(&self) -> &BuildEnvironment {
        &self.env
    }

    /// External tools the requested phases call
    pub fn required_tools(&self, phases: Phases) -> Vec<&'static str> {
        let mut tools: Vec<&'static str> = Vec::new();
        if phases.dependencies {
            tools.extend(defaults::BUILD_TOOLS);
            if self.selection.projection_library {
                tools.push(defaults::DATUM_TOOL);
            }
        }
        if phases.target {
            tools.push("make");
        }
        if phases.package {
            tools.push("tar");
            tools.extend(self.platform.os.strip_command().first());
            if self.platform.os.rewrites_links() {
                tools.extend(defaults::RELOCATION_TOOLS);
            }
        }
        let mut seen = std::collections::HashSet::new();
        tools.retain(|tool| seen.insert(*tool));
        tools
    }

    /// Fail early if a tool needed by `phases` is not on the build PATH
    pub fn preflight(&self, phases: Phases) -> Result<(), BundleError> {
        let tools = self.required_tools(phases);
        process::require_tools(&tools, &self.env.path_var(), self.config.source_dir())?;
        Ok(())
    }

    /// Recreate the destination and build trees
    pub fn setup(&self) -> Result<(), BundleError> {
        setup::prepare_tree(&self.config)?;
        Ok(())
    }

    /// Dependency recipes for the current selection
    pub fn plan_dependencies(&self) -> Result<Pipeline, BundleError> {
        let dependencies = self.dependencies.as_ref().ok_or(ConfigError::NotLoaded)?;
        Ok(Pipeline::plan(
            dependencies,
            &self.config,
            &self.platform,
            &self.env,
            self.selection,
        )?)
    }

    /// Build and install the selected dependencies
    pub async fn build_dependencies(
        &self,
        fetcher: &Fetcher,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<String>, BundleError> {
        let pipeline = self.plan_dependencies()?;
        pipeline.run(&self.env, fetcher, runner).await
    }

    /// Configure, build and install cencalvm
    pub fn build_target(&self, runner: &dyn CommandRunner) -> Result<(), BundleError> {
        TargetBuilder::new(&self.config, &self.platform, &self.env).run(runner)
    }

    /// Package the destination tree
    pub fn package(&self, runner: &dyn CommandRunner) -> Result<PackageReport, BundleError> {
        Packager::new(&self.config, &self.platform, &self.env).run(runner)
    }

    /// Run the requested phases in order, stopping at the first failure
    pub async fn run(
        &self,
        phases: Phases,
        fetcher: &Fetcher,
        runner: &dyn CommandRunner,
    ) -> Result<BundleSummary, BundleError> {
        let mut summary = BundleSummary::default();
        if phases.setup {
            self.setup()?;
        }
        if phases.dependencies {
            summary.dependencies = self.build_dependencies(fetcher, runner).await?;
        }
        if phases.target {
            self.build_target(runner)?;
            summary.target_installed = true;
        }
        if phases.package {
            summary.package = Some(self.package(runner)?);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingRunner;
    use std::path::Path;
    use tempfile::TempDir;

    fn bundle(os: &str) -> (TempDir, Bundle) {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig::new(temp.path(), &temp.path().join("base"), 2).unwrap();
        let platform = Platform::from_parts(os, "x86_64").unwrap();
        let env = BuildEnvironment::with_home(&config, &platform, None);
        let bundle = Bundle::new(config, platform).with_environment(env);
        (temp, bundle)
    }

    #[test]
    fn test_phases() {
        assert!(Phases::default().is_empty());
        assert!(!Phases::all().is_empty());
    }

    #[test]
    fn test_required_tools_linux() {
        let (_temp, bundle) = bundle("linux");
        assert_eq!(
            bundle.required_tools(Phases::all()),
            ["tar", "make", "unzip", "strip"]
        );
        assert!(bundle.required_tools(Phases::default()).is_empty());
    }

    #[test]
    fn test_required_tools_darwin_package() {
        let (_temp, bundle) = bundle("macos");
        let phases = Phases {
            package: true,
            ..Phases::default()
        };
        assert_eq!(
            bundle.required_tools(phases),
            ["tar", "strip", "otool", "install_name_tool"]
        );
    }

    #[test]
    fn test_preflight_reports_missing_tool() {
        let (temp, bundle) = bundle("linux");
        let empty = temp.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();
        let mut env = bundle.env().clone();
        env.path = vec![empty];
        let bundle = bundle.with_environment(env);

        let phases = Phases {
            target: true,
            ..Phases::default()
        };
        assert!(matches!(
            bundle.preflight(phases),
            Err(BundleError::Process(crate::error::ProcessError::ToolNotFound { .. }))
        ));
        assert!(bundle.preflight(Phases::default()).is_ok());
    }

    #[tokio::test]
    async fn test_dependencies_without_config() {
        let (_temp, bundle) = bundle("linux");
        let runner = RecordingRunner::new();
        let phases = Phases {
            dependencies: true,
            target: true,
            ..Phases::default()
        };

        let result = bundle.run(phases, &Fetcher::new(), &runner).await;

        assert!(matches!(
            result,
            Err(BundleError::Config(ConfigError::NotLoaded))
        ));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_setup_then_target() {
        let (_temp, bundle) = bundle("linux");
        let runner = RecordingRunner::new();
        let phases = Phases {
            setup: true,
            target: true,
            ..Phases::default()
        };

        let summary = bundle.run(phases, &Fetcher::new(), &runner).await.unwrap();

        assert!(summary.target_installed);
        assert!(summary.dependencies.is_empty());
        assert!(bundle.config().dest_dir().join("include").is_dir());
        assert_eq!(runner.command_lines()[1..], ["make -j2", "make install"]);
        assert!(Path::new(&runner.calls()[0].program).ends_with("configure"));
    }

    #[tokio::test]
    async fn test_failed_target_skips_package() {
        let (_temp, bundle) = bundle("linux");
        let runner = RecordingRunner::failing_on(|inv| inv.args == ["install"]);
        let phases = Phases {
            target: true,
            package: true,
            ..Phases::default()
        };

        let result = bundle.run(phases, &Fetcher::new(), &runner).await;

        assert!(matches!(result, Err(BundleError::Install(_))));
        assert!(!runner.calls().iter().any(|c| c.program == "tar"));
    }
}
