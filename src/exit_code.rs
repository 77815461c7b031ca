//! Exit codes for the `ccdb` binary.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - the path, entry or value was resolved
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - critical failure that should halt automation
//! - `3`: Not found - the command ran but nothing applied
//! - `6`: Configuration error - settings could not be loaded

use crate::error::ResolutionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Contract violation or critical I/O failure (code 2)
    BlockingError = 2,

    /// Nothing resolved but the command executed successfully (code 3)
    NotFound = 3,

    /// Configuration error (code 6)
    ConfigError = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// `Success` when something was resolved, `NotFound` otherwise
    pub fn from_lookup<T>(result: &Option<T>) -> Self {
        match result {
            Some(_) => ExitCode::Success,
            None => ExitCode::NotFound,
        }
    }

    pub fn from_error(error: &ResolutionError) -> Self {
        if error.is_critical() {
            ExitCode::BlockingError
        } else {
            ExitCode::GeneralError
        }
    }

    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "Not found",
            ExitCode::ConfigError => "Configuration error",
        }
    }
}
