//! Recipes for the bundled dependencies
//!
//! - gcc (with mpc, gmp and mpfr unpacked into its source tree)
//! - euclid, built from a platform makefile shipped next to this tool
//! - proj, plus its datum grid zip

use crate::core::build_env::BuildEnvironment;
use crate::core::config::DependencySpec;
use crate::core::platform::Platform;
use crate::core::recipe::{Alias, Extraction, Recipe, RemoteFile, Step};
use crate::core::settings::BuildConfig;

fn remote(spec: &DependencySpec, filename: String) -> RemoteFile {
    RemoteFile {
        base_url: spec.url.clone(),
        filename,
        sha256: spec.sha256.clone(),
    }
}

/// gcc toolchain with its bundled sub-libraries
pub fn gcc(
    spec: &DependencySpec,
    subpackages: &[DependencySpec],
    config: &BuildConfig,
    env: &BuildEnvironment,
) -> Recipe {
    let build_root = config.build_dir();
    let source_dir = build_root.join(spec.versioned_name());
    let build_dir = build_root.join("gcc-build");

    let mut downloads = vec![remote(spec, spec.tarball())];
    downloads.extend(subpackages.iter().map(|sub| remote(sub, sub.tarball())));

    let mut extractions = vec![Extraction {
        archive: build_root.join(spec.tarball()),
        into: build_root.to_path_buf(),
        alias: None,
    }];
    extractions.extend(subpackages.iter().map(|sub| Extraction {
        archive: build_root.join(sub.tarball()),
        into: source_dir.clone(),
        alias: Some(Alias {
            canonical: sub.name.clone(),
            versioned: sub.versioned_name(),
        }),
    }));

    let configure = env
        .command(source_dir.join("configure").display().to_string(), &build_dir)
        .args([
            config.prefix_arg(),
            "--disable-multilib".to_string(),
            "--enable-languages=c,c++".to_string(),
        ]);

    Recipe {
        name: spec.name.clone(),
        download_dir: build_root.to_path_buf(),
        downloads,
        extractions,
        build: vec![
            Step::CreateDir(build_dir.clone()),
            Step::Run(configure),
            Step::Run(env.command("make", &build_dir).arg(config.jobs_arg())),
        ],
        install: vec![Step::Run(env.command("make", &build_dir).arg("install"))],
    }
}

/// euclid, built with a makefile chosen by platform
///
/// Its archive and directory carry no dash: `euclid<version>`.
pub fn euclid(
    spec: &DependencySpec,
    config: &BuildConfig,
    platform: &Platform,
    env: &BuildEnvironment,
) -> Recipe {
    let build_root = config.build_dir();
    let stem = format!("{}{}", spec.name, spec.version);
    let tarball = format!("{stem}.tar.{}", spec.suffix);
    let libsrc = build_root.join(&stem).join("libsrc");

    let env = env
        .clone()
        .with_env("PREFIX", &config.dest_dir().display().to_string());

    Recipe {
        name: spec.name.clone(),
        download_dir: build_root.to_path_buf(),
        downloads: vec![remote(spec, tarball.clone())],
        extractions: vec![Extraction {
            archive: build_root.join(&tarball),
            into: build_root.to_path_buf(),
            alias: None,
        }],
        build: vec![
            Step::CopyFile {
                from: config.source_dir().join(platform.os.euclid_makefile()),
                to: libsrc.join("makefile.cencalvm"),
            },
            Step::Run(env.command("make", &libsrc).args(["-f", "makefile.cencalvm"])),
        ],
        install: vec![Step::Run(
            env.command("make", &libsrc)
                .args(["install", "-f", "makefile.cencalvm"]),
        )],
    }
}

/// proj, plus the datum grids unzipped into `share/proj`
pub fn proj(
    spec: &DependencySpec,
    datum_version: &str,
    datum_sha256: Option<&str>,
    config: &BuildConfig,
    env: &BuildEnvironment,
) -> Recipe {
    let build_root = config.build_dir();
    let source_dir = build_root.join(spec.versioned_name());
    let build_dir = build_root.join("proj-build");
    let datum = format!("proj-datumgrid-{datum_version}.zip");
    let share_dir = config.dest_dir().join("share").join("proj");

    let configure = env
        .command(source_dir.join("configure").display().to_string(), &build_dir)
        .args([config.prefix_arg(), "--with-jni=no".to_string()]);

    Recipe {
        name: spec.name.clone(),
        download_dir: build_root.to_path_buf(),
        downloads: vec![
            remote(spec, spec.tarball()),
            RemoteFile {
                base_url: spec.url.clone(),
                filename: datum.clone(),
                sha256: datum_sha256.map(str::to_string),
            },
        ],
        extractions: vec![Extraction {
            archive: build_root.join(spec.tarball()),
            into: build_root.to_path_buf(),
            alias: None,
        }],
        build: vec![
            Step::CreateDir(build_dir.clone()),
            Step::Run(configure),
            Step::Run(env.command("make", &build_dir).arg(config.jobs_arg())),
        ],
        install: vec![
            Step::Run(env.command("make", &build_dir).arg("install")),
            Step::CreateDir(share_dir.clone()),
            Step::Run(env.command("unzip", &share_dir).args([
                "-o".to_string(),
                build_root.join(&datum).display().to_string(),
            ])),
        ],
    }
}
