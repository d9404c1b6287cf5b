//! cencalvm-bundle - Relocatable binary bundles for cencalvm
//!
//! Builds cencalvm and its third-party dependencies into one destination
//! tree and packages that tree as a self-contained archive.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Build phases, recipes and packaging
//! - [`infra`] - Infrastructure layer (network, filesystem, processes)
//! - [`config`] - Constants and defaults
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
