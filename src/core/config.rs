//! Dependency configuration
//!
//! Reads per-dependency versions, archive suffixes and source URLs from
//! `build.toml`:
//!
//! ```toml
//! [gcc]
//! version = "7.3.0"
//! suffix = "gz"
//! url = "https://ftp.gnu.org/gnu/gcc/gcc-7.3.0"
//!
//! [mpc]
//! version = "1.0.3"
//! suffix = "gz"
//!
//! [proj]
//! version = "4.9.3"
//! suffix = "gz"
//! url = "https://download.osgeo.org/proj"
//! datum_version = "1.6"
//! ```
//!
//! The gcc sub-libraries (`mpc`, `gmp`, `mpfr`) have no `url`; they are
//! fetched from the gcc URL.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Source archive section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSection {
    /// Upstream version
    pub version: String,
    /// Compression suffix of the `.tar.<suffix>` archive
    pub suffix: String,
    /// Base URL the archive is fetched from
    pub url: String,
    /// Optional SHA256 of the archive
    pub sha256: Option<String>,
}

/// gcc sub-library section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubpackageSection {
    /// Upstream version
    pub version: String,
    /// Compression suffix of the `.tar.<suffix>` archive
    pub suffix: String,
    /// Optional SHA256 of the archive
    pub sha256: Option<String>,
}

/// proj section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjSection {
    /// Upstream version
    pub version: String,
    /// Compression suffix of the `.tar.<suffix>` archive
    pub suffix: String,
    /// Base URL for both the source archive and the datum grids
    pub url: String,
    /// Optional SHA256 of the archive
    pub sha256: Option<String>,
    /// Version of the `proj-datumgrid-<version>.zip` bundle
    pub datum_version: String,
    /// Optional SHA256 of the datum grid zip
    pub datum_sha256: Option<String>,
}

/// Contents of `build.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BundleConfig {
    /// gcc toolchain
    pub gcc: Option<SourceSection>,
    /// gcc sub-library
    pub mpc: Option<SubpackageSection>,
    /// gcc sub-library
    pub gmp: Option<SubpackageSection>,
    /// gcc sub-library
    pub mpfr: Option<SubpackageSection>,
    /// Custom library
    pub euclid: Option<SourceSection>,
    /// Projection library
    pub proj: Option<ProjSection>,
}

/// Immutable description of one dependency archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    /// Dependency name (e.g., "gcc")
    pub name: String,
    /// Upstream version
    pub version: String,
    /// Compression suffix of the `.tar.<suffix>` archive
    pub suffix: String,
    /// Base URL the archive is fetched from
    pub url: String,
    /// Optional SHA256 of the archive
    pub sha256: Option<String>,
}

impl DependencySpec {
    /// `<name>-<version>`, the directory the archive unpacks to
    pub fn versioned_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// `<name>-<version>.tar.<suffix>`
    pub fn tarball(&self) -> String {
        format!("{}.tar.{}", self.versioned_name(), self.suffix)
    }
}

impl BundleConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { error, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: "<inline>".into(),
            error: e.to_string(),
        })
    }

    /// Spec for the gcc toolchain
    pub fn gcc(&self) -> Result<DependencySpec, ConfigError> {
        let section = require(self.gcc.as_ref(), "gcc")?;
        Ok(source_spec("gcc", section))
    }

    /// Specs for the gcc sub-libraries, fetched from the gcc URL
    pub fn gcc_subpackages(&self) -> Result<Vec<DependencySpec>, ConfigError> {
        let gcc = require(self.gcc.as_ref(), "gcc")?;
        [("mpc", &self.mpc), ("gmp", &self.gmp), ("mpfr", &self.mpfr)]
            .into_iter()
            .map(|(name, section)| {
                let section = require(section.as_ref(), name)?;
                Ok(DependencySpec {
                    name: name.to_string(),
                    version: section.version.clone(),
                    suffix: section.suffix.clone(),
                    url: gcc.url.clone(),
                    sha256: section.sha256.clone(),
                })
            })
            .collect()
    }

    /// Spec for euclid
    pub fn euclid(&self) -> Result<DependencySpec, ConfigError> {
        let section = require(self.euclid.as_ref(), "euclid")?;
        Ok(source_spec("euclid", section))
    }

    /// Spec for proj
    pub fn proj(&self) -> Result<DependencySpec, ConfigError> {
        let section = require(self.proj.as_ref(), "proj")?;
        Ok(DependencySpec {
            name: "proj".to_string(),
            version: section.version.clone(),
            suffix: section.suffix.clone(),
            url: section.url.clone(),
            sha256: section.sha256.clone(),
        })
    }

    /// proj section, for datum grid settings
    pub fn proj_section(&self) -> Result<&ProjSection, ConfigError> {
        require(self.proj.as_ref(), "proj")
    }
}

fn require<'a, T>(section: Option<&'a T>, name: &str) -> Result<&'a T, ConfigError> {
    section.ok_or_else(|| ConfigError::MissingSection {
        section: name.to_string(),
    })
}

fn source_spec(name: &str, section: &SourceSection) -> DependencySpec {
    DependencySpec {
        name: name.to_string(),
        version: section.version.clone(),
        suffix: section.suffix.clone(),
        url: section.url.clone(),
        sha256: section.sha256.clone(),
    }
}
