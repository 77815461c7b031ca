//! Picking the database entry that applies to a source or header file

use crate::common::{TestProject, slashed};
use ccdb::ResolutionError;

const DATABASE: &str = "out/build/x64-Debug/compile_commands.json";

/// Workspace with a database covering `src/widget.cpp` and `lib/codec.c`
fn project_with_database() -> TestProject {
    let project = TestProject::new();
    let root = slashed(project.path());
    let build = format!("{root}/out/build/x64-Debug");
    let widget = format!("{root}/src/widget.cpp");
    let codec = format!("{root}/lib/codec.c");
    project.add_database(
        DATABASE,
        &[(widget.as_str(), build.as_str()), (codec.as_str(), build.as_str())],
    );
    project
}

fn entry_file(project: &TestProject, relative: &str) -> Option<String> {
    project
        .resolver()
        .get_config(&project.path().join(relative))
        .unwrap()
        .map(|entry| entry.file().to_string())
}

#[test]
fn test_source_file_gets_its_own_entry() {
    let project = project_with_database();
    let root = slashed(project.path());

    assert_eq!(
        entry_file(&project, "src/widget.cpp"),
        Some(format!("{root}/src/widget.cpp"))
    );
}

#[test]
fn test_header_uses_sibling_source() {
    let project = project_with_database();
    let root = slashed(project.path());

    assert_eq!(
        entry_file(&project, "src/widget.h"),
        Some(format!("{root}/src/widget.cpp"))
    );
}

#[test]
fn test_header_uses_same_named_source_elsewhere() {
    let project = project_with_database();
    let root = slashed(project.path());

    assert_eq!(
        entry_file(&project, "include/codec.hpp"),
        Some(format!("{root}/lib/codec.c"))
    );
}

#[test]
fn test_header_without_name_match_uses_entry_under_its_directory() {
    let project = project_with_database();
    let root = slashed(project.path());

    assert_eq!(
        entry_file(&project, "lib/internal.h"),
        Some(format!("{root}/lib/codec.c"))
    );
}

#[test]
fn test_unrelated_header_falls_back_to_first_entry() {
    let project = project_with_database();
    let root = slashed(project.path());

    assert_eq!(
        entry_file(&project, "third_party/zlib.h"),
        Some(format!("{root}/src/widget.cpp"))
    );
}

#[test]
fn test_unknown_source_file_has_no_entry() {
    let project = project_with_database();
    assert_eq!(entry_file(&project, "src/missing.cpp"), None);
}

#[test]
fn test_command_is_split_into_arguments() {
    let project = project_with_database();
    let entry = project
        .resolver()
        .get_config(&project.path().join("src/widget.cpp"))
        .unwrap()
        .unwrap();

    let arguments = entry.arguments();
    assert_eq!(arguments.first().map(String::as_str), Some("c++"));
    assert_eq!(arguments.len(), 4);
    assert!(arguments[1].starts_with("-I"));
}

#[test]
fn test_relative_entry_resolved_against_directory() {
    let project = TestProject::new();
    let root = slashed(project.path());
    let build = format!("{root}/out/build/x64-Debug");
    project.add_database(DATABASE, &[("../../../src/main.cpp", build.as_str())]);

    let entry = project
        .resolver()
        .get_config(&project.path().join("src/main.cpp"))
        .unwrap();

    assert_eq!(
        entry.map(|e| e.file().to_string()),
        Some("../../../src/main.cpp".to_string())
    );
}

#[test]
fn test_explicit_database_bypasses_location() {
    let project = TestProject::new();
    let root = slashed(project.path());
    let app = format!("{root}/app.cc");
    let database = project.add_database("custom/cdb.json", &[(app.as_str(), root.as_str())]);

    let resolver = project.resolver();
    assert_eq!(resolver.get_config(&project.path().join("app.cc")).unwrap(), None);

    let entry = resolver
        .get_config_from(&database, &project.path().join("app.cc"))
        .unwrap();
    assert_eq!(entry.map(|e| e.file().to_string()), Some(format!("{root}/app.cc")));
}

#[test]
fn test_malformed_database_yields_none() {
    let project = TestProject::new();
    project.add_file(DATABASE, "[ { \"file\": ");

    let entry = project
        .resolver()
        .get_config(&project.path().join("src/main.cpp"))
        .unwrap();

    assert_eq!(entry, None);
}

#[test]
fn test_empty_file_path_is_rejected() {
    let project = project_with_database();

    let err = project
        .resolver()
        .get_config(std::path::Path::new(""))
        .unwrap_err();

    assert!(matches!(err, ResolutionError::EmptyFilePath));
}
