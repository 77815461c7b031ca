//! Compilation database location for the active build configuration
//!
//! A `CMakeSettings.json` at the workspace root takes exclusive precedence: when it
//! exists, the database must live under the active configuration's expanded
//! `buildRoot`, and any failure along that path is final. Only workspaces without a
//! settings file use the `out/build/<configuration>` convention.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::active_config::ActiveConfigurationResolver;
use super::build_settings::{BuildSettingsLocator, FoundSettings};
use super::macros::{EvaluationContext, MacroEvaluationEngine};
use super::paths::{absolutize, native_separators};
use super::provider::{FileSystem, RealFileSystem, WorkspaceRootProvider};
use crate::config::ResolutionConfig;
use crate::error::ResolutionResult;

/// Result of a location attempt, including why it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateOutcome {
    Found(PathBuf),
    NoWorkspaceRoot,
    /// The settings file exists but does not define the active configuration
    ConfigurationNotFound { name: String, settings_file: PathBuf },
    /// The active configuration has no `buildRoot`
    EmptyBuildRoot { name: String, settings_file: PathBuf },
    /// The `buildRoot` template contains an unresolvable macro
    BuildRootUnresolved { template: String },
    DatabaseMissing { attempted: PathBuf },
}

impl LocateOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Self::Found(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for LocateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(path) => write!(f, "{}", path.display()),
            Self::NoWorkspaceRoot => write!(f, "no workspace root is open"),
            Self::ConfigurationNotFound {
                name,
                settings_file,
            } => write!(
                f,
                "configuration '{name}' is not defined in {}",
                settings_file.display()
            ),
            Self::EmptyBuildRoot {
                name,
                settings_file,
            } => write!(
                f,
                "configuration '{name}' in {} has no buildRoot",
                settings_file.display()
            ),
            Self::BuildRootUnresolved { template } => {
                write!(f, "buildRoot '{template}' contains an unresolvable macro")
            }
            Self::DatabaseMissing { attempted } => {
                write!(f, "compilation database not found at {}", attempted.display())
            }
        }
    }
}

/// Computes where the compilation database of the active configuration lives
pub struct CompilationDatabaseLocator {
    root_provider: Arc<dyn WorkspaceRootProvider>,
    fs: Arc<dyn FileSystem>,
    active_config: ActiveConfigurationResolver,
    build_settings: BuildSettingsLocator,
    macros: MacroEvaluationEngine,
    database_file_name: String,
    default_build_dir: PathBuf,
}

impl CompilationDatabaseLocator {
    pub fn new(config: &ResolutionConfig, root_provider: Arc<dyn WorkspaceRootProvider>) -> Self {
        Self::with_collaborators(
            config,
            root_provider,
            Arc::new(RealFileSystem),
            MacroEvaluationEngine::new(),
        )
    }

    pub fn with_collaborators(
        config: &ResolutionConfig,
        root_provider: Arc<dyn WorkspaceRootProvider>,
        fs: Arc<dyn FileSystem>,
        macros: MacroEvaluationEngine,
    ) -> Self {
        Self {
            active_config: ActiveConfigurationResolver::with_file_system(config, fs.clone()),
            build_settings: BuildSettingsLocator::with_file_system(config, fs.clone()),
            root_provider,
            fs,
            macros,
            database_file_name: config.database_file_name.clone(),
            default_build_dir: config.default_build_dir.clone(),
        }
    }

    /// Path of the compilation database, if it can be determined and exists
    pub fn locate(&self) -> ResolutionResult<Option<PathBuf>> {
        Ok(self.locate_detailed()?.into_path())
    }

    /// Like [`locate`](Self::locate), but reports why location failed
    pub fn locate_detailed(&self) -> ResolutionResult<LocateOutcome> {
        let root = match self.root_provider.workspace_root() {
            Some(root) if !root.as_os_str().is_empty() => root,
            _ => {
                info!("No workspace root, cannot locate compilation database");
                return Ok(LocateOutcome::NoWorkspaceRoot);
            }
        };

        let found = self.build_settings.find(&root)?;
        let active = self.active_config.get_active_config(&root)?;

        let build_dir = match found {
            Some(found) => match self.build_dir_from_settings(&root, &active, &found) {
                Ok(dir) => dir,
                Err(outcome) => {
                    warn!("Cannot locate compilation database: {outcome}");
                    return Ok(outcome);
                }
            },
            None => root.join(&self.default_build_dir).join(&active),
        };

        let database = build_dir.join(&self.database_file_name);
        if self.fs.exists(&database) {
            debug!("Compilation database for '{active}': {}", database.display());
            Ok(LocateOutcome::Found(database))
        } else {
            info!("Compilation database not found at {}", database.display());
            Ok(LocateOutcome::DatabaseMissing {
                attempted: database,
            })
        }
    }

    fn build_dir_from_settings(
        &self,
        root: &Path,
        active: &str,
        found: &FoundSettings,
    ) -> Result<PathBuf, LocateOutcome> {
        let Some(configuration) = found.settings.configuration(active) else {
            return Err(LocateOutcome::ConfigurationNotFound {
                name: active.to_string(),
                settings_file: found.settings_file_path.clone(),
            });
        };

        let template = match configuration.build_root_template.as_deref() {
            Some(template) if !template.trim().is_empty() => template,
            _ => {
                return Err(LocateOutcome::EmptyBuildRoot {
                    name: active.to_string(),
                    settings_file: found.settings_file_path.clone(),
                });
            }
        };

        let context = EvaluationContext::for_configuration(active, root)
            .with_generator(configuration.generator.clone())
            .with_settings_file(&found.settings_file_path)
            .with_root_descriptor(&found.root_descriptor_path);

        let expanded = self.macros.evaluate(template, &context).ok_or_else(|| {
            LocateOutcome::BuildRootUnresolved {
                template: template.to_string(),
            }
        })?;

        Ok(absolutize(Path::new(&native_separators(&expanded)), root))
    }
}
