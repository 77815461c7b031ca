//! Collaborator traits consumed by the resolution components
//!
//! Every component has a `new` constructor wiring the real implementations below
//! and a `with_*` constructor taking injected ones, so tests can swap in doubles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies the root directory of the currently open workspace
pub trait WorkspaceRootProvider: Send + Sync {
    fn workspace_root(&self) -> Option<PathBuf>;
}

/// Workspace root known up front (CLI `--root`, tests)
#[derive(Debug, Clone, Default)]
pub struct FixedWorkspaceRoot(pub Option<PathBuf>);

impl FixedWorkspaceRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(Some(root.into()))
    }
}

impl WorkspaceRootProvider for FixedWorkspaceRoot {
    fn workspace_root(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Read-only file system access
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// The local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Source of environment variables for `${env.NAME}` macros
pub trait EnvironmentSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// Environment of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvironmentSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
