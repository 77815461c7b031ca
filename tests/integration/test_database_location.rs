//! Locating compile_commands.json in real workspace layouts

use crate::common::TestProject;
use ccdb::LocateOutcome;

#[test]
fn test_default_convention_without_settings_file() {
    let project = TestProject::new();
    let database = project.add_database("out/build/x64-Debug/compile_commands.json", &[]);

    let located = project.locator().locate().unwrap();

    assert_eq!(located, Some(database));
}

#[test]
fn test_active_configuration_selects_build_directory() {
    let project = TestProject::new();
    project.add_database("out/build/x64-Debug/compile_commands.json", &[]);
    let release = project.add_database("out/build/x64-Release/compile_commands.json", &[]);
    project.select_configuration("x64-Release");

    assert_eq!(project.locator().locate().unwrap(), Some(release));
}

#[test]
fn test_settings_file_build_root_is_expanded() {
    let project = TestProject::new();
    project.add_file("CMakeLists.txt", "cmake_minimum_required(VERSION 3.20)\n");
    project.add_file(
        "CMakeSettings.json",
        r#"{
  // Generated by the IDE
  "configurations": [
    {
      "name": "x64-Debug",
      "generator": "Ninja",
      "buildRoot": "${projectDir}/build/${name}",
    },
  ]
}"#,
    );
    let database = project.add_database("build/x64-Debug/compile_commands.json", &[]);

    assert_eq!(project.locator().locate().unwrap(), Some(database));
}

#[test]
fn test_settings_file_never_falls_back_to_convention() {
    let project = TestProject::new();
    project.add_database("out/build/x64-Debug/compile_commands.json", &[]);
    project.add_file(
        "CMakeSettings.json",
        r#"{ "configurations": [ { "name": "x64-Release", "buildRoot": "${projectDir}/out/build/${name}" } ] }"#,
    );

    let outcome = project.locator().locate_detailed().unwrap();

    assert!(matches!(
        outcome,
        LocateOutcome::ConfigurationNotFound { ref name, .. } if name == "x64-Debug"
    ));
    assert_eq!(project.locator().locate().unwrap(), None);
}

#[test]
fn test_unresolvable_build_root_reports_template() {
    let project = TestProject::new();
    project.add_file(
        "CMakeSettings.json",
        r#"{ "configurations": [ { "name": "x64-Debug", "buildRoot": "${env.CCDB_TEST_SURELY_UNSET_VARIABLE}/build" } ] }"#,
    );

    let outcome = project.locator().locate_detailed().unwrap();

    assert_eq!(
        outcome,
        LocateOutcome::BuildRootUnresolved {
            template: "${env.CCDB_TEST_SURELY_UNSET_VARIABLE}/build".to_string()
        }
    );
}

#[test]
fn test_missing_database_reports_attempted_path() {
    let project = TestProject::new();

    let outcome = project.locator().locate_detailed().unwrap();

    assert_eq!(
        outcome,
        LocateOutcome::DatabaseMissing {
            attempted: project
                .path()
                .join("out")
                .join("build")
                .join("x64-Debug")
                .join("compile_commands.json")
        }
    );
}

#[test]
fn test_malformed_marker_falls_back_to_default_configuration() {
    let project = TestProject::new();
    project.add_file(".vs/ProjectSettings.json", "{ not json");
    let database = project.add_database("out/build/x64-Debug/compile_commands.json", &[]);

    assert_eq!(project.locator().locate().unwrap(), Some(database));
}
