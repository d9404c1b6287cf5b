//! Dynamic library relocation (Darwin)
//!
//! Rewrites absolute dynamic library references in executables and dylibs
//! so they resolve relative to the executable, making the bundle usable
//! from any install location.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::defaults;
use crate::core::build_env::BuildEnvironment;
use crate::error::RewriteError;
use crate::infra::process::CommandRunner;

/// Outcome of a relocation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Binaries inspected
    pub binaries: usize,
    /// References rewritten
    pub changed: usize,
}

/// Parse the library references listed by `otool -L`
///
/// References are the indented lines. Unindented lines are headers naming the
/// binary, one per architecture slice in universal binaries. A reference
/// listed by several slices is returned once.
pub fn parse_dependencies(otool_output: &str) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();
    for line in otool_output.lines() {
        if !line.starts_with(char::is_whitespace) {
            continue;
        }
        if let Some(reference) = line.split_whitespace().next() {
            if !references.iter().any(|r| r == reference) {
                references.push(reference.to_string());
            }
        }
    }
    references
}

/// Relocated form of a reference, or `None` when it stays as is
///
/// System libraries and references that are already relative are left alone.
pub fn relocated_reference(reference: &str) -> Option<String> {
    if reference.starts_with('@') {
        return None;
    }
    let path = Path::new(reference);
    if defaults::SYSTEM_LIBRARY_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
    {
        return None;
    }
    let name = path.file_name()?.to_string_lossy();
    Some(format!("{}/../lib/{name}", defaults::RELOCATION_ANCHOR))
}

/// Binaries under `dest` whose references get rewritten
///
/// `bin/*` plus every `*.dylib` below `lib/`, skipping symlinks, directories
/// and the gcc stub libraries.
pub fn collect_binaries(dest: &Path) -> Result<Vec<PathBuf>, RewriteError> {
    let mut binaries = Vec::new();

    let bin = dest.join("bin");
    if bin.is_dir() {
        for entry in WalkDir::new(&bin)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| scan_error(&bin, &e))?;
            if entry.file_type().is_file() {
                binaries.push(entry.into_path());
            }
        }
    }

    let lib = dest.join("lib");
    if lib.is_dir() {
        for entry in WalkDir::new(&lib).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| scan_error(&lib, &e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let is_stub = entry.depth() == 1 && name.starts_with(defaults::STUB_DYLIB_PREFIX);
            let is_dylib = name.ends_with(".dylib");
            if is_dylib && !is_stub {
                binaries.push(entry.into_path());
            }
        }
    }

    Ok(binaries)
}

fn scan_error(path: &Path, error: &walkdir::Error) -> RewriteError {
    RewriteError::Scan {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

/// Rewrite the references of one binary, returning how many were changed
pub fn rewrite_binary(
    binary: &Path,
    cwd: &Path,
    env: &BuildEnvironment,
    runner: &dyn CommandRunner,
) -> Result<usize, RewriteError> {
    let binary_arg = binary.display().to_string();
    let inspect = env
        .command("otool", cwd)
        .args(["-L", binary_arg.as_str()])
        .capturing();
    let listing = runner
        .run(&inspect)
        .map_err(|source| RewriteError::Inspect {
            binary: binary.to_path_buf(),
            source,
        })?;

    let mut changed = 0;
    for reference in parse_dependencies(&listing.stdout) {
        let Some(relocated) = relocated_reference(&reference) else {
            continue;
        };
        tracing::debug!("{}: {reference} -> {relocated}", binary.display());
        let invocation = env
            .command("install_name_tool", cwd)
            .args([
                "-change",
                reference.as_str(),
                relocated.as_str(),
                binary_arg.as_str(),
            ]);
        runner
            .run(&invocation)
            .map_err(|source| RewriteError::Change {
                binary: binary.to_path_buf(),
                reference: reference.clone(),
                source,
            })?;
        changed += 1;
    }
    Ok(changed)
}

/// Rewrite every binary in the destination tree
///
/// A failing binary does not stop the pass. Once every binary has been
/// visited, any failures are reported together as
/// [`RewriteError::Incomplete`].
pub fn rewrite_bundle(
    dest: &Path,
    env: &BuildEnvironment,
    runner: &dyn CommandRunner,
) -> Result<RewriteReport, RewriteError> {
    let binaries = collect_binaries(dest)?;
    tracing::info!("Relocating library references in {} binaries", binaries.len());

    let mut report = RewriteReport::default();
    let mut failed = Vec::new();
    for binary in &binaries {
        report.binaries += 1;
        match rewrite_binary(binary, dest, env, runner) {
            Ok(changed) => report.changed += changed,
            Err(e) => {
                match std::error::Error::source(&e) {
                    Some(cause) => tracing::warn!("{e}: {cause}"),
                    None => tracing::warn!("{e}"),
                }
                failed.push(binary.clone());
            }
        }
    }

    if failed.is_empty() {
        Ok(report)
    } else {
        Err(RewriteError::Incomplete { failed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Platform;
    use crate::core::settings::BuildConfig;
    use crate::test_utils::{generators, RecordingRunner};
    use proptest::prelude::*;
    use tempfile::TempDir;

    const QUERY_LISTING: &str = "bin/cencalvmquery:\n\
        \t/opt/local/lib/libproj.12.dylib (compatibility version 13.0.0, current version 13.1.0)\n\
        \t/Users/builder/cencalvm-binary/dist/lib/libcencalvm.0.dylib (compatibility version 1.0.0, current version 1.0.0)\n\
        \t/usr/lib/libc++.1.dylib (compatibility version 1.0.0, current version 400.9.0)\n\
        \t/usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1252.0.0)\n";

    fn darwin_tree() -> (TempDir, BuildConfig, BuildEnvironment) {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig::new(temp.path(), temp.path(), 1).unwrap();
        let dest = config.dest_dir();
        std::fs::create_dir_all(dest.join("bin")).unwrap();
        std::fs::create_dir_all(dest.join("lib/gcc/x86_64")).unwrap();
        std::fs::write(dest.join("bin/cencalvmquery"), b"macho").unwrap();
        std::fs::write(dest.join("lib/libcencalvm.0.dylib"), b"macho").unwrap();
        std::fs::write(dest.join("lib/libcencalvm.a"), b"ar").unwrap();
        std::fs::write(dest.join("lib/libgcc_ext.10.5.dylib"), b"stub").unwrap();
        std::fs::write(dest.join("lib/gcc/x86_64/libquadmath.0.dylib"), b"macho").unwrap();
        std::os::unix::fs::symlink("libcencalvm.0.dylib", dest.join("lib/libcencalvm.dylib"))
            .unwrap();
        let platform = Platform::from_parts("macos", "x86_64").unwrap();
        let env = BuildEnvironment::with_home(&config, &platform, None);
        (temp, config, env)
    }

    #[test]
    fn test_parse_dependencies() {
        assert_eq!(
            parse_dependencies(QUERY_LISTING),
            [
                "/opt/local/lib/libproj.12.dylib",
                "/Users/builder/cencalvm-binary/dist/lib/libcencalvm.0.dylib",
                "/usr/lib/libc++.1.dylib",
                "/usr/lib/libSystem.B.dylib",
            ]
        );
        assert!(parse_dependencies("bin/empty:\n").is_empty());
    }

    #[test]
    fn test_parse_dependencies_universal_binary() {
        let listing = "bin/cencalvminfo (architecture x86_64):\n\
            \t/opt/lib/libA.dylib (compatibility version 1.0.0, current version 1.0.0)\n\
            bin/cencalvminfo (architecture arm64):\n\
            \t/opt/lib/libA.dylib (compatibility version 1.0.0, current version 1.0.0)\n";
        assert_eq!(parse_dependencies(listing), ["/opt/lib/libA.dylib"]);
    }

    #[test]
    fn test_relocated_reference() {
        assert_eq!(
            relocated_reference("/opt/local/lib/libfoo.dylib").as_deref(),
            Some("@executable_path/../lib/libfoo.dylib")
        );
        assert_eq!(relocated_reference("/usr/lib/libSystem.B.dylib"), None);
        assert_eq!(
            relocated_reference("/System/Library/Frameworks/CoreFoundation.framework/CoreFoundation"),
            None
        );
        assert_eq!(relocated_reference("@executable_path/../lib/libfoo.dylib"), None);
    }

    #[test]
    fn test_collect_binaries_skips_stubs_symlinks_and_archives() {
        let (_temp, config, _env) = darwin_tree();
        let dest = config.dest_dir();
        let found: Vec<_> = collect_binaries(dest)
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(dest).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            [
                PathBuf::from("bin/cencalvmquery"),
                PathBuf::from("lib/gcc/x86_64/libquadmath.0.dylib"),
                PathBuf::from("lib/libcencalvm.0.dylib"),
            ]
        );
    }

    #[test]
    fn test_rewrite_binary_changes_only_non_system_references() {
        let (_temp, config, env) = darwin_tree();
        let dest = config.dest_dir();
        let binary = dest.join("bin/cencalvmquery");
        let runner = RecordingRunner::new().with_stdout("otool", QUERY_LISTING);

        let changed = rewrite_binary(&binary, dest, &env, &runner).unwrap();

        assert_eq!(changed, 2);
        let lines = runner.command_lines();
        let binary = binary.display();
        assert_eq!(
            lines,
            [
                format!("otool -L {binary}"),
                format!(
                    "install_name_tool -change /opt/local/lib/libproj.12.dylib @executable_path/../lib/libproj.12.dylib {binary}"
                ),
                format!(
                    "install_name_tool -change /Users/builder/cencalvm-binary/dist/lib/libcencalvm.0.dylib @executable_path/../lib/libcencalvm.0.dylib {binary}"
                ),
            ]
        );
        assert!(runner.calls()[0].capture);
    }

    #[test]
    fn test_rewrite_bundle_continues_after_failure() {
        let (_temp, config, env) = darwin_tree();
        let dest = config.dest_dir().to_path_buf();
        let failing = dest.join("lib/gcc/x86_64/libquadmath.0.dylib").display().to_string();
        let runner = RecordingRunner::failing_on(move |inv| {
            inv.program == "otool" && inv.args.last() == Some(&failing)
        })
        .with_stdout("otool", QUERY_LISTING);

        match rewrite_bundle(&dest, &env, &runner) {
            Err(RewriteError::Incomplete { failed }) => {
                assert_eq!(failed, [dest.join("lib/gcc/x86_64/libquadmath.0.dylib")]);
            }
            other => panic!("Expected Incomplete error, got: {other:?}"),
        }

        // The binaries before and after the failing one were both rewritten
        let otool_calls = runner
            .calls()
            .into_iter()
            .filter(|inv| inv.program == "otool")
            .count();
        assert_eq!(otool_calls, 3);
        let changes = runner
            .calls()
            .into_iter()
            .filter(|inv| inv.program == "install_name_tool")
            .count();
        assert_eq!(changes, 4);
    }

    #[test]
    fn test_rewrite_bundle_report() {
        let (_temp, config, env) = darwin_tree();
        let runner = RecordingRunner::new().with_stdout("otool", QUERY_LISTING);

        let report = rewrite_bundle(config.dest_dir(), &env, &runner).unwrap();

        assert_eq!(
            report,
            RewriteReport {
                binaries: 3,
                changed: 6
            }
        );
    }

    #[test]
    fn test_rewrite_empty_tree() {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig::new(temp.path(), temp.path(), 1).unwrap();
        let platform = Platform::from_parts("macos", "arm64").unwrap();
        let env = BuildEnvironment::with_home(&config, &platform, None);
        let runner = RecordingRunner::new();

        let report = rewrite_bundle(config.dest_dir(), &env, &runner).unwrap();
        assert_eq!(report, RewriteReport::default());
        assert!(runner.calls().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Non-system references are anchored on the executable, keeping the file name
        #[test]
        fn prop_relocation_keeps_file_name(
            dir in generators::install_dir(),
            name in generators::library_name(),
            version in generators::version_suffix(),
        ) {
            let file = format!("{name}{version}.dylib");
            let relocated = relocated_reference(&format!("{dir}/{file}"));
            prop_assert_eq!(relocated, Some(format!("@executable_path/../lib/{file}")));
        }

        /// System references are never touched
        #[test]
        fn prop_system_references_untouched(
            prefix in prop_oneof![Just("/usr/lib"), Just("/usr/local/lib"), Just("/System/Library")],
            name in generators::library_name(),
        ) {
            prop_assert_eq!(relocated_reference(&format!("{prefix}/{name}.dylib")), None);
        }
    }
}
