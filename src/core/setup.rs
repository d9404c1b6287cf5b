//! Fresh build and destination trees

use crate::core::settings::BuildConfig;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Delete and recreate the destination tree (with `lib` and `include`) and
/// the build tree
pub fn prepare_tree(config: &BuildConfig) -> Result<(), FilesystemError> {
    let dest = config.dest_dir();
    tracing::info!("Recreating {}", dest.display());
    filesystem::recreate_dir(dest)?;
    filesystem::create_dir_all(&dest.join("lib"))?;
    filesystem::create_dir_all(&dest.join("include"))?;

    tracing::info!("Recreating {}", config.build_dir().display());
    filesystem::recreate_dir(config.build_dir())
}
