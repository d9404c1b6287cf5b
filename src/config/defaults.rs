//! Default configuration values

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "build.toml";

/// Default base directory name under `$HOME`
pub const DEFAULT_BASE_DIR_NAME: &str = "cencalvm-binary";

/// Default number of parallel make jobs
pub const DEFAULT_MAKE_THREADS: usize = 8;

/// Destination tree directory name under the base directory
pub const DEST_DIR_NAME: &str = "dist";

/// Build tree directory name under the base directory
pub const BUILD_DIR_NAME: &str = "build";

/// Build subdirectory used for cencalvm itself
pub const TARGET_BUILD_DIR_NAME: &str = "cencalvm-build";

/// Prefixes of dynamic library references that stay absolute
pub const SYSTEM_LIBRARY_PREFIXES: &[&str] = &["/usr", "/System"];

/// Anchor for relocated dynamic library references
pub const RELOCATION_ANCHOR: &str = "@executable_path";

/// Shared library stubs that cannot be edited by the toolchain
pub const STUB_LIBRARY_SUFFIX: &str = "_s.so";

/// Script files that live next to libraries and are never stripped
pub const SCRIPT_EXTENSION: &str = ".py";

/// Stub dynamic libraries that cannot be rewritten
pub const STUB_DYLIB_PREFIX: &str = "libgcc_ext";

/// Tools every dependency build needs on the PATH
pub const BUILD_TOOLS: &[&str] = &["tar", "make"];

/// Extra tool needed to install the proj datum grids
pub const DATUM_TOOL: &str = "unzip";

/// Tools needed on Darwin to relocate the bundle
pub const RELOCATION_TOOLS: &[&str] = &["otool", "install_name_tool"];
