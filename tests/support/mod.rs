//! Test support utilities for sentra integration tests.
//!
//! Provides isolated state directories, scan roots with fake projects, and
//! helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// `root` is the scan root and `home` the state directory. Child processes
/// get both through environment variables, so tests can run in parallel.
pub struct Test {
    /// Scan root holding fake projects
    pub root: TempDir,
    /// State directory (`SENTRA_HOME`)
    pub home: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let root = TempDir::new().expect("failed to create temp scan root");
        let home = TempDir::new().expect("failed to create temp home");
        Self { root, home }
    }

    /// Environment with the given projects created under the scan root.
    pub fn with_projects(projects: &[&str]) -> Self {
        let t = Self::new();
        for name in projects {
            t.project(name);
        }
        t
    }

    /// Create a project directory (with a `.git` marker).
    pub fn project(&self, name: &str) -> PathBuf {
        let dir = self.root.path().join(name);
        fs::create_dir_all(dir.join(".git")).expect("failed to create project");
        dir
    }

    /// Write `contents` to `rel` under the scan root, creating parents.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(&path, contents).expect("failed to write file");
        path
    }

    pub fn state(&self) -> &Path {
        self.home.path()
    }
}
