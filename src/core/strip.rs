//! Debug symbol stripping
//!
//! Collects executables and shared libraries from the destination tree and
//! strips them with a single `strip` call.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::build_env::BuildEnvironment;
use crate::core::platform::OsFamily;
use crate::error::StripError;
use crate::infra::filesystem;
use crate::infra::process::CommandRunner;

/// Executables, relative to the destination tree
const EXECUTABLE_PATTERNS: &[&str] = &["bin/*"];

/// Libraries and compiler-internal tools, relative to the destination tree
const LIBRARY_PATTERNS: &[&str] = &[
    "lib/lib*",
    "lib64/lib*",
    "libexec/gcc/*/*/cc1*",
    "libexec/gcc/*/*/lto1*",
    "libexec/gcc/*/*/lt-wrapper*",
];

/// A path found by a strip pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path relative to the destination tree
    pub path: PathBuf,
    /// Whether the entry is a symbolic link
    pub is_symlink: bool,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl Candidate {
    /// Plain file candidate
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_symlink: false,
            is_dir: false,
        }
    }

    /// Symlink candidate
    pub fn symlink(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_symlink: true,
            is_dir: false,
        }
    }
}

/// Decide which candidates get stripped
///
/// Symlinks and directories are never stripped. Libraries must also not be
/// stubs (`_s.so`) or scripts (`.py`), and their name must contain the
/// platform's shared library suffix.
pub fn select_strip_targets(
    executables: &[Candidate],
    libraries: &[Candidate],
    library_suffix: &str,
) -> Vec<PathBuf> {
    let executables = executables
        .iter()
        .filter(|c| !c.is_symlink && !c.is_dir)
        .map(|c| c.path.clone());

    let libraries = libraries
        .iter()
        .filter(|c| !c.is_symlink && !c.is_dir)
        .filter(|c| {
            let name = c.path.to_string_lossy();
            !name.ends_with(defaults::STUB_LIBRARY_SUFFIX)
                && !name.ends_with(defaults::SCRIPT_EXTENSION)
                && name.contains(library_suffix)
        })
        .map(|c| c.path.clone());

    executables.chain(libraries).collect()
}

/// Expand patterns under `root`, returning paths relative to `root`
pub fn collect_candidates(root: &Path, patterns: &[&str]) -> Result<Vec<Candidate>, StripError> {
    let mut candidates = Vec::new();
    let escaped_root = PathBuf::from(glob::Pattern::escape(&root.to_string_lossy()));
    for pattern in patterns {
        let full = escaped_root.join(pattern);
        let entries = glob::glob(&full.to_string_lossy()).map_err(|e| StripError::Pattern {
            pattern: (*pattern).to_string(),
            error: e.to_string(),
        })?;
        for path in entries.filter_map(Result::ok) {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            candidates.push(Candidate {
                is_symlink: filesystem::is_symlink(&path),
                is_dir: path.is_dir(),
                path: relative,
            });
        }
    }
    Ok(candidates)
}

/// Strip every selected file under `dest`
///
/// Returns the number of files passed to `strip`.
pub fn strip_tree(
    dest: &Path,
    os: OsFamily,
    env: &BuildEnvironment,
    runner: &dyn CommandRunner,
) -> Result<usize, StripError> {
    let executables = collect_candidates(dest, EXECUTABLE_PATTERNS)?;
    let libraries = collect_candidates(dest, LIBRARY_PATTERNS)?;
    let targets = select_strip_targets(&executables, &libraries, os.shared_library_suffix());

    if targets.is_empty() {
        tracing::warn!("Nothing to strip in {}", dest.display());
        return Ok(0);
    }

    let (program, flags) = os
        .strip_command()
        .split_first()
        .map_or(("strip", &[][..]), |(p, f)| (*p, f));

    let invocation = env
        .command(program, dest)
        .args(flags.iter().copied())
        .args(targets.iter().map(|p| p.display().to_string()));

    tracing::info!("Stripping {} files", targets.len());
    runner.run(&invocation)?;
    Ok(targets.len())
}
