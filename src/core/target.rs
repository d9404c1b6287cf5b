//! cencalvm build
//!
//! Configures, builds and installs cencalvm into the destination tree
//! populated by the dependency pipeline.

use std::path::PathBuf;

use crate::config::defaults;
use crate::core::build_env::BuildEnvironment;
use crate::core::platform::Platform;
use crate::core::recipe::Step;
use crate::core::settings::BuildConfig;
use crate::error::{BuildError, BundleError, InstallError, StepError};
use crate::infra::process::CommandRunner;

const PACKAGE: &str = "cencalvm";

/// Builder for the main library
#[derive(Debug)]
pub struct TargetBuilder<'a> {
    config: &'a BuildConfig,
    platform: &'a Platform,
    env: &'a BuildEnvironment,
}

impl<'a> TargetBuilder<'a> {
    /// Create a builder
    pub fn new(config: &'a BuildConfig, platform: &'a Platform, env: &'a BuildEnvironment) -> Self {
        Self {
            config,
            platform,
            env,
        }
    }

    /// Out-of-tree build directory
    pub fn build_dir(&self) -> PathBuf {
        self.config.build_dir().join(defaults::TARGET_BUILD_DIR_NAME)
    }

    /// Steps of the configure phase
    pub fn configure_steps(&self) -> Vec<Step> {
        let dest = self.config.dest_dir();
        let compilers = self.platform.os.compilers();
        let configure = self
            .config
            .project_dir()
            .join("configure")
            .display()
            .to_string();

        vec![
            Step::CreateDir(self.build_dir()),
            Step::Run(self.env.command(configure, self.build_dir()).args([
                self.config.prefix_arg(),
                format!("CPPFLAGS=-I{}", dest.join("include").display()),
                format!("LDFLAGS=-L{}", dest.join("lib").display()),
                format!("CC={}", compilers.cc),
                format!("CXX={}", compilers.cxx),
            ])),
        ]
    }

    /// Run the project's configure script
    pub fn configure(&self, runner: &dyn CommandRunner) -> Result<(), BuildError> {
        tracing::info!("Configuring {PACKAGE}");
        run_steps(&self.configure_steps(), runner).map_err(|source| BuildError::StepFailed {
            package: PACKAGE.to_string(),
            source,
        })
    }

    /// Run `make -j<threads>`
    pub fn build(&self, runner: &dyn CommandRunner) -> Result<(), BuildError> {
        tracing::info!("Building {PACKAGE}");
        let step = Step::Run(
            self.env
                .command("make", self.build_dir())
                .arg(self.config.jobs_arg()),
        );
        step.execute(runner).map_err(|source| BuildError::StepFailed {
            package: PACKAGE.to_string(),
            source,
        })
    }

    /// Run `make install`
    pub fn install(&self, runner: &dyn CommandRunner) -> Result<(), InstallError> {
        tracing::info!("Installing {PACKAGE}");
        let step = Step::Run(self.env.command("make", self.build_dir()).arg("install"));
        step.execute(runner).map_err(|source| InstallError::StepFailed {
            package: PACKAGE.to_string(),
            source,
        })
    }

    /// Configure, build and install
    pub fn run(&self, runner: &dyn CommandRunner) -> Result<(), BundleError> {
        self.configure(runner)?;
        self.build(runner)?;
        self.install(runner)?;
        Ok(())
    }
}

fn run_steps(steps: &[Step], runner: &dyn CommandRunner) -> Result<(), StepError> {
    steps.iter().try_for_each(|step| step.execute(runner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingRunner;
    use tempfile::TempDir;

    fn setup(os: &str) -> (TempDir, BuildConfig, Platform) {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig::new(&temp.path().join("src/packager"), temp.path(), 6).unwrap();
        let platform = Platform::from_parts(os, "x86_64").unwrap();
        (temp, config, platform)
    }

    #[test]
    fn test_linux_configure_uses_gcc() {
        let (_temp, config, platform) = setup("linux");
        let env = BuildEnvironment::with_home(&config, &platform, None);
        let runner = RecordingRunner::new();
        TargetBuilder::new(&config, &platform, &env)
            .configure(&runner)
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let dest = config.dest_dir().display().to_string();
        assert_eq!(
            calls[0].args,
            [
                format!("--prefix={dest}"),
                format!("CPPFLAGS=-I{dest}/include"),
                format!("LDFLAGS=-L{dest}/lib"),
                "CC=gcc".to_string(),
                "CXX=g++".to_string(),
            ]
        );
        assert!(calls[0].program.ends_with("src/packager/../configure"));
        assert_eq!(calls[0].cwd, config.build_dir().join("cencalvm-build"));
        assert!(calls[0].cwd.is_dir());
    }

    #[test]
    fn test_darwin_configure_uses_clang() {
        let (_temp, config, platform) = setup("macos");
        let env = BuildEnvironment::with_home(&config, &platform, None);
        let runner = RecordingRunner::new();
        TargetBuilder::new(&config, &platform, &env)
            .configure(&runner)
            .unwrap();

        let args = &runner.calls()[0].args;
        assert!(args.contains(&"CC=clang".to_string()));
        assert!(args.contains(&"CXX=clang++".to_string()));
    }

    #[test]
    fn test_run_order() {
        let (_temp, config, platform) = setup("linux");
        let env = BuildEnvironment::with_home(&config, &platform, None);
        let runner = RecordingRunner::new();
        TargetBuilder::new(&config, &platform, &env)
            .run(&runner)
            .unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "make -j6");
        assert_eq!(lines[2], "make install");
    }

    #[test]
    fn test_failed_build_skips_install() {
        let (_temp, config, platform) = setup("linux");
        let env = BuildEnvironment::with_home(&config, &platform, None);
        let runner = RecordingRunner::failing_on(|inv| inv.args == ["-j6"]);
        let result = TargetBuilder::new(&config, &platform, &env).run(&runner);

        assert!(matches!(result, Err(BundleError::Build(_))));
        assert!(!runner.command_lines().contains(&"make install".to_string()));
    }
}
