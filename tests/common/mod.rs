use ccdb::config::ResolutionConfig;
use ccdb::{CompilationDatabaseLocator, CompilationEntryResolver, FixedWorkspaceRoot};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Record `name` as the IDE's active configuration
    pub fn select_configuration(&self, name: &str) -> PathBuf {
        self.add_file(
            ".vs/ProjectSettings.json",
            &format!(r#"{{ "CurrentProjectSetting": "{name}" }}"#),
        )
    }

    /// Write a compilation database with one entry per `(file, directory)` pair
    pub fn add_database(&self, path: &str, entries: &[(&str, &str)]) -> PathBuf {
        let entries: Vec<_> = entries
            .iter()
            .map(|(file, directory)| {
                serde_json::json!({
                    "file": file,
                    "directory": directory,
                    "command": format!("c++ -I{directory}/include -c {file}"),
                })
            })
            .collect();
        let content = serde_json::to_string_pretty(&entries).expect("Failed to encode database");
        self.add_file(path, &content)
    }

    pub fn locator(&self) -> CompilationDatabaseLocator {
        CompilationDatabaseLocator::new(
            &ResolutionConfig::default(),
            Arc::new(FixedWorkspaceRoot::new(self.path())),
        )
    }

    pub fn resolver(&self) -> CompilationEntryResolver {
        CompilationEntryResolver::new(self.locator())
    }
}

/// Forward-slash rendering of a path, as compile_commands.json writes it
pub fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
