//! Host platform description
//!
//! The platform is resolved once at startup. Every behavior that differs
//! between Linux and Darwin dispatches on [`OsFamily`] here, so a new branch
//! cannot be forgotten silently.

use std::fmt;

use crate::error::PlatformError;

/// Supported operating system families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Linux (gcc toolchain is built from source)
    Linux,
    /// macOS (system clang is assumed present)
    Darwin,
}

/// C/C++ compiler pair handed to configure scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerPair {
    /// C compiler
    pub cc: &'static str,
    /// C++ compiler
    pub cxx: &'static str,
}

impl OsFamily {
    /// Lowercase family name used in support file names
    pub fn name(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
        }
    }

    /// Compilers used to configure cencalvm
    pub fn compilers(self) -> CompilerPair {
        match self {
            Self::Linux => CompilerPair {
                cc: "gcc",
                cxx: "g++",
            },
            Self::Darwin => CompilerPair {
                cc: "clang",
                cxx: "clang++",
            },
        }
    }

    /// Marker contained in shared library file names
    pub fn shared_library_suffix(self) -> &'static str {
        match self {
            Self::Linux => ".so",
            Self::Darwin => ".dylib",
        }
    }

    /// Strip program followed by its flags
    pub fn strip_command(self) -> &'static [&'static str] {
        match self {
            Self::Linux => &["strip"],
            Self::Darwin => &["strip", "-x"],
        }
    }

    /// Whether the gcc toolchain is built as a dependency
    pub fn builds_toolchain(self) -> bool {
        match self {
            Self::Linux => true,
            Self::Darwin => false,
        }
    }

    /// Whether dynamic library references must be rewritten before packaging
    pub fn rewrites_links(self) -> bool {
        match self {
            Self::Linux => false,
            Self::Darwin => true,
        }
    }

    /// Setup script shipped in the bundle root
    pub fn setup_script(self) -> String {
        format!("setup_{}.sh", self.name())
    }

    /// Makefile used to build euclid
    pub fn euclid_makefile(self) -> String {
        format!("makefile_euclid_{}", self.name())
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "Linux"),
            Self::Darwin => write!(f, "Darwin"),
        }
    }
}

/// Operating system family and machine architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// OS family
    pub os: OsFamily,
    /// Machine architecture (e.g., "x86_64", "aarch64")
    pub arch: String,
}

impl Platform {
    /// Detect the current host platform
    pub fn detect() -> Result<Self, PlatformError> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build a platform from OS and architecture names
    ///
    /// Accepts both Rust target names ("linux", "macos") and `uname` names
    /// ("Linux", "Darwin").
    pub fn from_parts(os: &str, arch: &str) -> Result<Self, PlatformError> {
        let family = match os.to_ascii_lowercase().as_str() {
            "linux" => OsFamily::Linux,
            "macos" | "darwin" => OsFamily::Darwin,
            _ => {
                return Err(PlatformError::Unsupported {
                    os: os.to_string(),
                    arch: arch.to_string(),
                })
            }
        };
        Ok(Self {
            os: family,
            arch: arch.to_string(),
        })
    }

    /// Linux on x86_64 also installs into `lib64`
    pub fn uses_lib64(&self) -> bool {
        self.os == OsFamily::Linux && self.arch == "x86_64"
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
