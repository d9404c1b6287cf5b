//! Core build logic
//!
//! # Submodules
//!
//! - [`platform`] - Host platform description and per-OS behavior
//! - [`settings`] - Build directory layout
//! - [`config`] - Dependency configuration (`build.toml`)
//! - [`build_env`] - Subprocess environment
//! - [`recipe`] / [`recipes`] - Data-driven dependency recipes
//! - [`dependency`] - Per-dependency lifecycle state machine
//! - [`pipeline`] - Ordered, fail-fast dependency pipeline
//! - [`target`] - cencalvm configure, build and install
//! - [`strip`] - Debug symbol stripping
//! - [`relocate`] - Dynamic library relocation (Darwin)
//! - [`package`] - Archive assembly
//! - [`setup`] - Fresh build and destination trees
//! - [`bundle`] - Phase orchestration

pub mod build_env;
pub mod bundle;
pub mod config;
pub mod dependency;
pub mod package;
pub mod pipeline;
pub mod platform;
pub mod recipe;
pub mod recipes;
pub mod relocate;
pub mod settings;
pub mod setup;
pub mod strip;
pub mod target;
