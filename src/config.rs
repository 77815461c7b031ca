//! Configuration module for compilation database resolution.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.ccdb/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CCDB_` and use double underscores
//! to separate nested levels:
//! - `CCDB_RESOLUTION__DEFAULT_CONFIGURATION=x64-Release` sets `resolution.default_configuration`
//! - `CCDB_TOOLCHAIN__TIMEOUT_MS=60000` sets `toolchain.timeout_ms`
//! - `CCDB_LOG_LEVEL=debug` sets `log_level`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::compdb::provider::WorkspaceRootProvider;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Workspace root directory (where CMakeLists.txt lives)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Default tracing level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// File names and conventions used to locate compilation databases
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Toolchain environment bootstrap settings
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ResolutionConfig {
    /// Configuration used when the IDE has not recorded one
    #[serde(default = "default_configuration")]
    pub default_configuration: String,

    /// Marker file recording the active configuration, relative to the root
    #[serde(default = "default_active_config_file")]
    pub active_config_file: PathBuf,

    /// Build settings file directly under the root
    #[serde(default = "default_settings_file_name")]
    pub settings_file_name: String,

    /// Root project descriptor, the `${projectFile}` macro
    #[serde(default = "default_root_descriptor_name")]
    pub root_descriptor_name: String,

    #[serde(default = "default_database_file_name")]
    pub database_file_name: String,

    /// Build directory used when no build settings file exists, relative to the root
    #[serde(default = "default_build_dir")]
    pub default_build_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// Script establishing the toolchain environment (e.g. vcvarsall.bat)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_script: Option<PathBuf>,

    /// Hard limit for one bootstrap run in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Keep failed fetches cached instead of retrying them on the next request
    #[serde(default = "default_false")]
    pub cache_failures: bool,
}

impl ToolchainConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_configuration() -> String {
    "x64-Debug".to_string()
}
fn default_active_config_file() -> PathBuf {
    PathBuf::from(".vs").join("ProjectSettings.json")
}
fn default_settings_file_name() -> String {
    "CMakeSettings.json".to_string()
}
fn default_root_descriptor_name() -> String {
    "CMakeLists.txt".to_string()
}
fn default_database_file_name() -> String {
    "compile_commands.json".to_string()
}
fn default_build_dir() -> PathBuf {
    PathBuf::from("out").join("build")
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_false() -> bool {
    false
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace_root: None,
            log_level: default_log_level(),
            resolution: ResolutionConfig::default(),
            toolchain: ToolchainConfig::default(),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            default_configuration: default_configuration(),
            active_config_file: default_active_config_file(),
            settings_file_name: default_settings_file_name(),
            root_descriptor_name: default_root_descriptor_name(),
            database_file_name: default_database_file_name(),
            default_build_dir: default_build_dir(),
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            bootstrap_script: None,
            timeout_ms: default_timeout_ms(),
            cache_failures: false,
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".ccdb/settings.toml"));

        Self::figment(config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::discover_workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels, single underscores
            // stay inside field names
            .merge(Env::prefixed("CCDB_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
    }

    /// Find `.ccdb/settings.toml` searching from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".ccdb");
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// The nearest ancestor of the current directory holding `.ccdb`
    pub fn discover_workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(".ccdb").is_dir())
            .map(|ancestor| ancestor.to_path_buf())
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}

impl WorkspaceRootProvider for Settings {
    /// Configured root, else the discovered `.ccdb` ancestor, else the current directory
    fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root
            .clone()
            .or_else(Self::discover_workspace_root)
            .or_else(|| std::env::current_dir().ok())
    }
}
