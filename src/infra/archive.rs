//! Source archive extraction
//!
//! Extraction shells out to `tar`, which picks the decompressor from the
//! archive itself.

use std::path::Path;

use crate::core::build_env::BuildEnvironment;
use crate::error::UnpackError;
use crate::infra::process::CommandRunner;

/// Extract `archive` into `dir`
pub fn unpack(
    runner: &dyn CommandRunner,
    env: &BuildEnvironment,
    archive: &Path,
    dir: &Path,
) -> Result<(), UnpackError> {
    let invocation = env
        .command("tar", dir)
        .arg("-xf")
        .arg(archive.display().to_string());

    runner
        .run(&invocation)
        .map(|_| ())
        .map_err(|source| UnpackError::Extract {
            archive: archive.to_path_buf(),
            source,
        })
}

/// Create the symlink `dir/canonical -> versioned`
///
/// Nothing is done when an entry named `canonical` already exists, whether it
/// is a link, a directory or a file. Returns whether a link was created.
pub fn alias_directory(dir: &Path, canonical: &str, versioned: &str) -> Result<bool, UnpackError> {
    let link = dir.join(canonical);
    if std::fs::symlink_metadata(&link).is_ok() {
        tracing::debug!("{} already exists, keeping it", link.display());
        return Ok(false);
    }

    std::os::unix::fs::symlink(versioned, &link).map_err(|e| UnpackError::Alias {
        link: link.clone(),
        target: versioned.to_string(),
        error: e.to_string(),
    })?;
    tracing::debug!("Linked {} -> {versioned}", link.display());
    Ok(true)
}
