//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no build logic - that belongs in the [`crate::core`] module.

pub mod output;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use crate::config::defaults;
use crate::core::bundle::{Bundle, Phases};
use crate::core::config::BundleConfig;
use crate::core::platform::Platform;
use crate::core::settings::BuildConfig;
use crate::infra::download::Fetcher;
use crate::infra::process::SystemRunner;

/// cencalvm-bundle - Build relocatable cencalvm binary packages
///
/// Builds cencalvm and its dependencies into one tree and packages it.
#[derive(Parser, Debug)]
#[command(name = "cencalvm-bundle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Dependency configuration file
    #[arg(long, default_value = defaults::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Recreate the destination and build trees
    #[arg(long)]
    pub setup: bool,

    /// Download, build and install the dependencies
    #[arg(long)]
    pub build_dependencies: bool,

    /// Configure, build and install cencalvm
    #[arg(long)]
    pub build_cencalvm: bool,

    /// Strip, relocate and archive the destination tree
    #[arg(long)]
    pub package: bool,

    /// Run every phase
    #[arg(long)]
    pub all: bool,

    /// Base directory for the build and destination trees [default: ~/cencalvm-binary]
    #[arg(long, env = "CENCALVM_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Number of parallel make jobs
    #[arg(long, default_value_t = defaults::DEFAULT_MAKE_THREADS)]
    pub make_threads: usize,

    /// Directory with setup scripts and euclid makefiles; receives the archive
    #[arg(long, default_value = ".")]
    pub source_dir: PathBuf,

    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Phases selected by the flags
    pub fn phases(&self) -> Phases {
        if self.all {
            return Phases::all();
        }
        Phases {
            setup: self.setup,
            dependencies: self.build_dependencies,
            target: self.build_cencalvm,
            package: self.package,
        }
    }

    /// Log filter for the verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }

    /// Execute the requested phases
    pub async fn run(self) -> Result<()> {
        let phases = self.phases();
        if phases.is_empty() {
            Self::command().print_help()?;
            return Ok(());
        }

        let platform = Platform::detect()?;
        let base_dir = self
            .base_dir
            .clone()
            .unwrap_or_else(BuildConfig::default_base_dir);
        let config = BuildConfig::new(&self.source_dir, &base_dir, self.make_threads)?;
        tracing::info!(
            "Bundling for {platform} into {}",
            config.dest_dir().display()
        );

        let mut bundle = Bundle::new(config, platform);
        if phases.dependencies {
            let dependencies = BundleConfig::load(&self.config).with_context(|| {
                format!("Failed to load dependency configuration {}", self.config.display())
            })?;
            bundle = bundle.with_dependencies(dependencies);
        }

        bundle.preflight(phases)?;

        let fetcher =
            Fetcher::new().with_progress(!self.quiet && std::io::stderr().is_terminal());
        let summary = bundle.run(phases, &fetcher, &SystemRunner).await?;

        if !self.quiet {
            for line in output::summary_lines(&summary) {
                println!("{line}");
            }
        }
        Ok(())
    }
}
