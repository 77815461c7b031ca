//! `CMakeSettings.json` discovery and parsing
//!
//! Only the fields the resolver needs are modelled; the IDE writes many more
//! (inherited environments, cmake variables, ...) and they are ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::provider::{FileSystem, RealFileSystem};
use super::read_if_present;
use crate::config::ResolutionConfig;
use crate::error::{ResolutionError, ResolutionResult};

/// One named configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfigurationDescriptor {
    #[serde(default)]
    pub name: String,

    /// Build directory template, e.g. `${projectDir}\out\build\${name}`
    #[serde(rename = "buildRoot", default, skip_serializing_if = "Option::is_none")]
    pub build_root_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

/// Parsed build settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettingsFile {
    #[serde(default)]
    pub configurations: Vec<BuildConfigurationDescriptor>,
}

impl BuildSettingsFile {
    /// Configuration whose name matches exactly (case-sensitive)
    pub fn configuration(&self, name: &str) -> Option<&BuildConfigurationDescriptor> {
        self.configurations.iter().find(|c| c.name == name)
    }
}

/// A settings file found on disk together with the paths macro evaluation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundSettings {
    pub settings: BuildSettingsFile,
    pub settings_file_path: PathBuf,
    pub root_descriptor_path: PathBuf,
}

/// Parse build settings content (JSON with comments and trailing commas)
pub fn parse_build_settings(path: &Path, content: &str) -> ResolutionResult<BuildSettingsFile> {
    json5::from_str(content).map_err(|e| ResolutionError::malformed(path, e.to_string()))
}

/// Looks for the build settings file directly under a workspace root
pub struct BuildSettingsLocator {
    fs: Arc<dyn FileSystem>,
    settings_file_name: String,
    root_descriptor_name: String,
}

impl BuildSettingsLocator {
    pub fn new(config: &ResolutionConfig) -> Self {
        Self::with_file_system(config, Arc::new(RealFileSystem))
    }

    pub fn with_file_system(config: &ResolutionConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            settings_file_name: config.settings_file_name.clone(),
            root_descriptor_name: config.root_descriptor_name.clone(),
        }
    }

    /// Find and parse the settings file.
    ///
    /// Absent and unparseable files both yield `Ok(None)`; only critical read
    /// failures are returned as errors.
    pub fn find(&self, root_directory: &Path) -> ResolutionResult<Option<FoundSettings>> {
        let settings_file_path = root_directory.join(&self.settings_file_name);

        let Some(content) = read_if_present(self.fs.as_ref(), &settings_file_path)? else {
            debug!("No build settings file at {}", settings_file_path.display());
            return Ok(None);
        };

        match parse_build_settings(&settings_file_path, &content) {
            Ok(settings) => Ok(Some(FoundSettings {
                settings,
                settings_file_path,
                root_descriptor_path: root_directory.join(&self.root_descriptor_name),
            })),
            Err(e) => {
                warn!("Ignoring build settings: {e}");
                Ok(None)
            }
        }
    }
}
