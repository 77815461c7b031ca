//! Error types for compilation database resolution
//!
//! Resolution distinguishes three classes of failure:
//! - contract violations (missing root, empty file path) surface immediately as `Err`
//! - recoverable conditions (missing or malformed files) are logged and become `None`
//! - critical failures (see [`ResolutionError::is_critical`]) always propagate
//!
//! Toolchain environment fetches have their own [`ToolchainError`] because they fail
//! for process-level reasons (spawn, timeout) rather than file-level ones.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while locating or reading compilation databases and settings files
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error(
        "Workspace root directory is required\nSuggestion: Pass --root or set workspace_root in .ccdb/settings.toml"
    )]
    MissingWorkspaceRoot,

    #[error("File path is required to resolve a compilation database entry")]
    EmptyFilePath,

    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed file '{path}': {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Unrecoverable failure while reading '{path}': {source}")]
    Critical {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ResolutionError {
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if is_critical_io(&source) {
            Self::Critical { path, source }
        } else {
            Self::FileRead { path, source }
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error must propagate instead of being converted to "not found".
    ///
    /// Contract violations are critical too: they signal a caller bug, not a
    /// missing file.
    pub fn is_critical(&self) -> bool {
        match self {
            Self::MissingWorkspaceRoot | Self::EmptyFilePath | Self::Critical { .. } => true,
            Self::FileRead { .. } | Self::Malformed { .. } => false,
        }
    }

    /// Stable code for programmatic handling
    pub fn status_code(&self) -> String {
        match self {
            Self::MissingWorkspaceRoot => "MISSING_WORKSPACE_ROOT",
            Self::EmptyFilePath => "EMPTY_FILE_PATH",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::Malformed { .. } => "MALFORMED_FILE",
            Self::Critical { .. } => "CRITICAL_IO_ERROR",
        }
        .to_string()
    }

    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::MissingWorkspaceRoot => vec![
                "Run ccdb from inside the project directory",
                "Set workspace_root in .ccdb/settings.toml or pass --root",
            ],
            Self::EmptyFilePath => vec!["Pass the absolute path of a source or header file"],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::Malformed { .. } => vec![
                "Check the JSON syntax of the file",
                "Regenerate compile_commands.json by re-running the CMake configure step",
            ],
            Self::Critical { .. } => vec!["Free system resources and retry"],
        }
    }
}

/// I/O failures that must never be absorbed as "file not found".
fn is_critical_io(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::OutOfMemory)
}

/// Errors produced while fetching a toolchain environment snapshot
#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(
        "No toolchain bootstrap script configured\nSuggestion: Set toolchain.bootstrap_script in .ccdb/settings.toml"
    )]
    NotConfigured,

    #[error("Toolchain bootstrap timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Toolchain bootstrap produced no environment block: {reason}")]
    MissingOutput { reason: String },

    #[error("I/O error while reading bootstrap output: {0}")]
    Io(#[from] io::Error),
}

impl ToolchainError {
    pub fn status_code(&self) -> String {
        match self {
            Self::NotConfigured => "TOOLCHAIN_NOT_CONFIGURED",
            Self::Spawn { .. } => "TOOLCHAIN_SPAWN_FAILED",
            Self::Timeout { .. } => "TOOLCHAIN_TIMEOUT",
            Self::MissingOutput { .. } => "TOOLCHAIN_MISSING_OUTPUT",
            Self::Io(_) => "TOOLCHAIN_IO_ERROR",
        }
        .to_string()
    }

    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Spawn { .. } => vec![
                "Check that toolchain.bootstrap_script points to an existing script",
                "Ensure the system shell is available on PATH",
            ],
            Self::NotConfigured => {
                vec!["Set toolchain.bootstrap_script or CCDB_TOOLCHAIN__BOOTSTRAP_SCRIPT"]
            }
            Self::Timeout { .. } => vec![
                "Increase toolchain.timeout_ms in .ccdb/settings.toml",
                "Run the bootstrap script manually to check that it terminates",
            ],
            Self::MissingOutput { .. } => {
                vec!["Run the bootstrap script manually and check it exits successfully"]
            }
            Self::Io(_) => vec![],
        }
    }
}

/// Result type alias for resolution operations
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Result type alias for toolchain operations
pub type ToolchainResult<T> = Result<T, ToolchainError>;
