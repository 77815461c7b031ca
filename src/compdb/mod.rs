//! Compilation database resolution
//!
//! Given a workspace root and the IDE's active build configuration, find the
//! `compile_commands.json` CMake generated for that configuration and pick the entry
//! whose compiler flags apply to a source or header file.
//!
//! - [`active_config`]: "Which configuration is selected?"
//! - [`build_settings`]: "Where does that configuration build to?"
//! - [`macros`]: expands the `${...}` templates in build roots
//! - [`locator`]: "Where is the compilation database?"
//! - [`entry`]: "Which database entry applies to this file?"

pub mod active_config;
pub mod build_settings;
pub mod entry;
pub mod locator;
pub mod macros;
pub mod paths;
pub mod provider;
pub mod stable_id;

pub use active_config::ActiveConfigurationResolver;
pub use build_settings::{
    BuildConfigurationDescriptor, BuildSettingsFile, BuildSettingsLocator, FoundSettings,
};
pub use entry::{CompilationDatabaseEntry, CompilationEntryResolver, FileKind, classify};
pub use locator::{CompilationDatabaseLocator, LocateOutcome};
pub use macros::{EvaluationContext, MacroEvaluationEngine};
pub use provider::{
    EnvironmentSource, FileSystem, FixedWorkspaceRoot, ProcessEnvironment, RealFileSystem,
    WorkspaceRootProvider,
};
pub use stable_id::{StableId, stable_id};

use std::path::Path;
use tracing::warn;

use crate::error::{ResolutionError, ResolutionResult};

/// Read `path` if it exists.
///
/// Recoverable read failures are logged and reported as absent; critical ones
/// propagate.
pub(crate) fn read_if_present(fs: &dyn FileSystem, path: &Path) -> ResolutionResult<Option<String>> {
    if !fs.exists(path) {
        return Ok(None);
    }
    match fs.read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) => {
            let error = ResolutionError::file_read(path, e);
            if error.is_critical() {
                return Err(error);
            }
            warn!("{error}");
            Ok(None)
        }
    }
}
