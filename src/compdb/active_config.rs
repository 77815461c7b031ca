//! Active build configuration lookup
//!
//! The IDE records the configuration selected in its toolbar in
//! `.vs/ProjectSettings.json`:
//!
//! ```json
//! { "CurrentProjectSetting": "x64-Release" }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::provider::{FileSystem, RealFileSystem};
use super::read_if_present;
use crate::config::ResolutionConfig;
use crate::error::{ResolutionError, ResolutionResult};

#[derive(Debug, Deserialize)]
struct ProjectSettings {
    #[serde(rename = "CurrentProjectSetting")]
    current_project_setting: Option<String>,
}

/// Reads the active configuration name, falling back to a fixed default
pub struct ActiveConfigurationResolver {
    fs: Arc<dyn FileSystem>,
    marker_file: PathBuf,
    default_name: String,
}

impl ActiveConfigurationResolver {
    pub fn new(config: &ResolutionConfig) -> Self {
        Self::with_file_system(config, Arc::new(RealFileSystem))
    }

    pub fn with_file_system(config: &ResolutionConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            marker_file: config.active_config_file.clone(),
            default_name: config.default_configuration.clone(),
        }
    }

    /// Name of the configuration currently selected for `root_directory`.
    ///
    /// Missing, unreadable or malformed marker files yield the default name. Only an
    /// empty root is an error.
    pub fn get_active_config(&self, root_directory: &Path) -> ResolutionResult<String> {
        if root_directory.as_os_str().is_empty() {
            return Err(ResolutionError::MissingWorkspaceRoot);
        }

        let marker = root_directory.join(&self.marker_file);
        let Some(content) = read_if_present(self.fs.as_ref(), &marker)? else {
            debug!(
                "No active configuration marker at {}, using '{}'",
                marker.display(),
                self.default_name
            );
            return Ok(self.default_name.clone());
        };

        match json5::from_str::<ProjectSettings>(&content) {
            Ok(ProjectSettings {
                current_project_setting: Some(name),
            }) if !name.is_empty() => Ok(name),
            Ok(_) => {
                debug!(
                    "{} has no CurrentProjectSetting, using '{}'",
                    marker.display(),
                    self.default_name
                );
                Ok(self.default_name.clone())
            }
            Err(e) => {
                warn!(
                    "Failed to parse {}: {e}. Using '{}'",
                    marker.display(),
                    self.default_name
                );
                Ok(self.default_name.clone())
            }
        }
    }
}
