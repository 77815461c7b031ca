//! Settings drive the locator: custom names and an explicit workspace root

use crate::common::{TestProject, slashed};
use ccdb::{CompilationDatabaseLocator, Settings};
use std::sync::Arc;

#[test]
fn test_settings_file_overrides_names_and_root() {
    let project = TestProject::new();
    let root = slashed(project.path());
    let config_path = project.add_file(
        ".ccdb/settings.toml",
        &format!(
            r#"
workspace_root = "{root}"

[resolution]
default_configuration = "Linux-Debug"
database_file_name = "cdb.json"
default_build_dir = "cmake-build"
"#
        ),
    );
    let database = project.add_file("cmake-build/Linux-Debug/cdb.json", "[]");

    let settings = Arc::new(Settings::load_from(&config_path).unwrap());
    let locator = CompilationDatabaseLocator::new(&settings.resolution, settings.clone());

    let located = locator.locate().unwrap().unwrap();
    assert_eq!(slashed(&located), slashed(&database));
}

#[test]
fn test_saved_settings_round_trip_through_locator() {
    let project = TestProject::new();
    let config_path = project.path().join(".ccdb").join("settings.toml");

    let mut settings = Settings::default();
    settings.workspace_root = Some(project.path().to_path_buf());
    settings.resolution.settings_file_name = "BuildSettings.json".to_string();
    settings.save(&config_path).unwrap();

    project.add_file(
        "BuildSettings.json",
        r#"{ "configurations": [ { "name": "x64-Debug", "buildRoot": "${workspaceRoot}/bin" } ] }"#,
    );
    let database = project.add_file("bin/compile_commands.json", "[]");

    let settings = Arc::new(Settings::load_from(&config_path).unwrap());
    let locator = CompilationDatabaseLocator::new(&settings.resolution, settings.clone());

    assert_eq!(locator.locate().unwrap(), Some(database));
}
