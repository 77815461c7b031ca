//! `${...}` macro expansion for build-root templates
//!
//! Supported tokens are `${name}` for builtins and `${env.NAME}` for environment
//! variables. Expansion is all-or-nothing: a single unresolvable token makes the
//! whole template unresolvable, since a half-expanded build path would point
//! somewhere arbitrary on disk.
//!
//! Scanning uses the `regex` crate, whose matcher runs in time linear in the input,
//! so hostile templates cannot trigger catastrophic backtracking.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::debug;

use super::provider::{EnvironmentSource, ProcessEnvironment};
use super::stable_id::stable_id;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?:([A-Za-z0-9_]+)\.)?([^$\{\}.\s]+)\}").expect("Invalid token regex")
});

/// Values the builtin macros are computed from
///
/// Built once per expansion; evaluation never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    pub active_configuration_name: String,
    pub root_directory: PathBuf,
    pub generator: Option<String>,
    /// Path of the build settings file the template came from (`thisFile`)
    pub settings_file_path: PathBuf,
    /// Path of the root project descriptor, `CMakeLists.txt` (`projectFile`)
    pub root_descriptor_path: PathBuf,
}

impl EvaluationContext {
    pub fn for_configuration(
        active_configuration_name: impl Into<String>,
        root_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            active_configuration_name: active_configuration_name.into(),
            root_directory: root_directory.into(),
            ..Self::default()
        }
    }

    pub fn with_generator(mut self, generator: Option<String>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file_path = path.into();
        self
    }

    pub fn with_root_descriptor(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_descriptor_path = path.into();
        self
    }
}

/// Expands `${...}` tokens against an [`EvaluationContext`] and an environment source
#[derive(Clone)]
pub struct MacroEvaluationEngine {
    environment: Arc<dyn EnvironmentSource>,
}

impl Default for MacroEvaluationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroEvaluationEngine {
    /// Engine resolving `${env.*}` against the current process environment
    pub fn new() -> Self {
        Self::with_environment(Arc::new(ProcessEnvironment))
    }

    pub fn with_environment(environment: Arc<dyn EnvironmentSource>) -> Self {
        Self { environment }
    }

    /// Expand every token in `template`, or return `None` if any token is unresolvable.
    ///
    /// Substituted values are never re-scanned.
    pub fn evaluate(&self, template: &str, context: &EvaluationContext) -> Option<String> {
        let mut result = String::with_capacity(template.len());
        let mut last_end = 0;

        for capture in TOKEN.captures_iter(template) {
            let whole = capture.get(0)?;
            let prefix = capture.get(1).map_or("", |m| m.as_str());
            let name = &capture[2];

            let Some(value) = self.resolve_token(prefix, name, context) else {
                debug!(
                    "Unresolvable macro '{}' in template '{}'",
                    whole.as_str(),
                    template
                );
                return None;
            };

            result.push_str(&template[last_end..whole.start()]);
            result.push_str(&value);
            last_end = whole.end();
        }

        result.push_str(&template[last_end..]);
        Some(result)
    }

    fn resolve_token(&self, prefix: &str, name: &str, context: &EvaluationContext) -> Option<String> {
        if prefix.is_empty() {
            builtin(name, context)
        } else if prefix.eq_ignore_ascii_case("env") {
            self.environment.var(name)
        } else {
            None
        }
    }
}

fn builtin(name: &str, context: &EvaluationContext) -> Option<String> {
    match name {
        "workspaceRoot" => Some(display(&context.root_directory)),
        "workspaceHash" | "projectHash" => {
            Some(stable_id(&display(&context.root_descriptor_path)).to_string())
        }
        "projectFile" => Some(display(&context.root_descriptor_path)),
        "projectDir" => Some(parent_of(&context.root_descriptor_path)),
        "projectDirName" => {
            let project_dir = parent_of(&context.root_descriptor_path);
            if project_dir.is_empty() {
                return None;
            }
            Path::new(&project_dir)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        }
        "thisFile" => Some(display(&context.settings_file_path)),
        "thisFileDir" => Some(parent_of(&context.settings_file_path)),
        "name" => Some(context.active_configuration_name.clone()),
        "generator" => context.generator.clone(),
        _ => None,
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn parent_of(path: &Path) -> String {
    path.parent().map(display).unwrap_or_default()
}
