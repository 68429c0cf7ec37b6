// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed stow root + target root pair and
// a fluent builder so each integration test can set up an isolated
// filesystem without repeating boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use stowage_cli::cli::{GlobalOpts, InstallOpts, RemoveOpts, RestowOpts};
use stowage_cli::commands::{self, Outcome};
use stowage_cli::logging::Logger;

/// An isolated stow root and target root backed by one `TempDir`.
///
/// Both directories are deleted automatically when the farm is dropped.
pub struct Farm {
    dir: tempfile::TempDir,
    /// The stow root containing the package directories.
    pub stow_root: PathBuf,
    /// The target root packages are linked into.
    pub target_root: PathBuf,
}

impl Farm {
    /// Create a farm with an empty stow root and target root.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let stow_root = dir.path().join("stow");
        let target_root = dir.path().join("home");
        std::fs::create_dir_all(&stow_root).expect("create stow root");
        std::fs::create_dir_all(&target_root).expect("create target root");
        // Canonicalize so link destinations compare exactly even when
        // the temp dir itself sits behind a symlink.
        let stow_root = std::fs::canonicalize(&stow_root).expect("canonicalize stow root");
        let target_root = std::fs::canonicalize(&target_root).expect("canonicalize target root");
        Self {
            dir,
            stow_root,
            target_root,
        }
    }

    /// Global options pointing at this farm's roots.
    pub fn opts(&self) -> GlobalOpts {
        GlobalOpts {
            dir: Some(self.stow_root.clone()),
            target: Some(self.target_root.clone()),
            dry_run: false,
        }
    }

    /// Global options with dry-run enabled.
    pub fn dry_run_opts(&self) -> GlobalOpts {
        GlobalOpts {
            dry_run: true,
            ..self.opts()
        }
    }

    /// Absolute path of `rel` under the target root.
    pub fn target(&self, rel: &str) -> PathBuf {
        self.target_root.join(rel)
    }

    /// Absolute path of `rel` inside package `name`.
    pub fn package_path(&self, name: &str, rel: &str) -> PathBuf {
        self.stow_root.join(name).join(rel)
    }

    /// Sorted entry names of a directory under the target root
    /// (`""` for the target root itself).
    pub fn target_entries(&self, rel: &str) -> Vec<String> {
        let dir = if rel.is_empty() {
            self.target_root.clone()
        } else {
            self.target(rel)
        };
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("read target dir")
            .map(|e| e.expect("read entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Fluent builder for [`Farm`].
pub struct FarmBuilder {
    farm: Farm,
}

impl FarmBuilder {
    /// Begin building a new empty farm.
    pub fn new() -> Self {
        Self { farm: Farm::new() }
    }

    /// Create an empty package directory.
    pub fn with_package(self, name: &str) -> Self {
        std::fs::create_dir_all(self.farm.stow_root.join(name)).expect("create package");
        self
    }

    /// Create `rel` inside package `name` with `content`.
    pub fn with_file(self, name: &str, rel: &str, content: &str) -> Self {
        let path = self.farm.package_path(name, rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create parents");
        std::fs::write(&path, content).expect("write package file");
        self
    }

    /// Create an (empty) directory `rel` inside package `name`.
    pub fn with_dir(self, name: &str, rel: &str) -> Self {
        std::fs::create_dir_all(self.farm.package_path(name, rel)).expect("create package dir");
        self
    }

    /// Create a pre-existing file at `rel` under the target root.
    pub fn with_target_file(self, rel: &str, content: &str) -> Self {
        let path = self.farm.target(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create parents");
        std::fs::write(&path, content).expect("write target file");
        self
    }

    /// Create a pre-existing directory at `rel` under the target root.
    pub fn with_target_dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.farm.target(rel)).expect("create target dir");
        self
    }

    /// Write `stowage.toml` at the stow root.
    pub fn with_settings(self, content: &str) -> Self {
        std::fs::write(self.farm.stow_root.join("stowage.toml"), content)
            .expect("write settings");
        self
    }

    /// Finish building and return the farm.
    pub fn build(self) -> Farm {
        self.farm
    }
}

/// Install `packages` into the farm, asserting the command itself ran.
pub fn install(farm: &Farm, packages: &[&str]) -> Outcome {
    try_install(farm, packages).expect("install command failed")
}

/// Install `packages`, returning the command result unasserted.
pub fn try_install(farm: &Farm, packages: &[&str]) -> anyhow::Result<Outcome> {
    let opts = InstallOpts {
        packages: packages.iter().map(ToString::to_string).collect(),
    };
    commands::install::run(&farm.opts(), &opts, &Logger::new())
}

/// Remove `packages` from the farm, asserting the command itself ran.
pub fn remove(farm: &Farm, packages: &[&str]) -> Outcome {
    let opts = RemoveOpts {
        packages: packages.iter().map(ToString::to_string).collect(),
    };
    commands::remove::run(&farm.opts(), &opts, &Logger::new()).expect("remove command failed")
}

/// Restow `packages`, asserting the command itself ran.
pub fn restow(farm: &Farm, packages: &[&str]) -> Outcome {
    let opts = RestowOpts {
        packages: packages.iter().map(ToString::to_string).collect(),
    };
    commands::restow::run(&farm.opts(), &opts, &Logger::new()).expect("restow command failed")
}

/// Assert that `path` is a symlink pointing at `dest`.
pub fn assert_links_to(path: &Path, dest: &Path) {
    let actual = std::fs::read_link(path)
        .unwrap_or_else(|e| panic!("{} is not a symlink: {e}", path.display()));
    assert_eq!(
        actual,
        dest,
        "{} links to {}, expected {}",
        path.display(),
        actual.display(),
        dest.display()
    );
}

/// Assert that `path` is a real directory (not a symlink).
pub fn assert_real_dir(path: &Path) {
    let meta = std::fs::symlink_metadata(path)
        .unwrap_or_else(|e| panic!("{} missing: {e}", path.display()));
    assert!(
        meta.is_dir() && !meta.is_symlink(),
        "{} should be a real directory",
        path.display()
    );
}
