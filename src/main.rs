//! cencalvm-bundle - Build relocatable cencalvm binary packages
//!
//! Entry point for the command-line application.

use anyhow::Result;
use clap::Parser;

use cencalvm_bundle::cli::output::display_error;
use cencalvm_bundle::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(cli.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
