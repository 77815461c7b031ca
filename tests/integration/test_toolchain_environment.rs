//! Toolchain environment bootstrap through a real shell script
#![cfg(unix)]

use crate::common::TestProject;
use ccdb::config::ToolchainConfig;
use ccdb::{EvaluationContext, MacroEvaluationEngine, ToolchainEnvironmentProvider};
use std::sync::Arc;

fn config_for(script: std::path::PathBuf) -> ToolchainConfig {
    ToolchainConfig {
        bootstrap_script: Some(script),
        timeout_ms: 10_000,
        cache_failures: false,
    }
}

#[tokio::test]
async fn test_snapshot_is_captured_once_per_params() {
    let project = TestProject::new();
    let counter = project.path().join("runs");
    let script = project.add_file(
        "vcvars.sh",
        &format!(
            "echo run >> \"{}\"\nexport CCDB_TARGET_ARCH=\"$1\"\n",
            counter.display()
        ),
    );
    let provider = ToolchainEnvironmentProvider::new(&config_for(script));

    let first = provider.get("x64").await.unwrap();
    let second = provider.get("x64").await.unwrap();

    assert_eq!(first.get("CCDB_TARGET_ARCH"), Some("x64"));
    assert!(Arc::ptr_eq(&first, &second));
    let runs = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(runs.lines().count(), 1);
    assert_eq!(provider.cached_keys(), vec!["x64".to_string()]);
}

#[tokio::test]
async fn test_failing_script_is_retried() {
    let project = TestProject::new();
    let counter = project.path().join("runs");
    let script = project.add_file(
        "broken.sh",
        &format!("echo run >> \"{}\"\nfalse\n", counter.display()),
    );
    let provider = ToolchainEnvironmentProvider::new(&config_for(script));

    assert!(provider.get("x64").await.is_none());
    assert!(provider.get("x64").await.is_none());

    let runs = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(runs.lines().count(), 2);
    assert!(provider.cached_keys().is_empty());
}

#[tokio::test]
async fn test_snapshot_feeds_env_macros() {
    let project = TestProject::new();
    let script = project.add_file("vcvars.sh", "export VCToolsInstallDir=/opt/msvc/14.38\n");
    let provider = ToolchainEnvironmentProvider::new(&config_for(script));
    let snapshot = provider.get("").await.unwrap();

    let engine = MacroEvaluationEngine::with_environment(snapshot);
    let context = EvaluationContext::for_configuration("x64-Debug", project.path());

    assert_eq!(
        engine.evaluate("${env.VCToolsInstallDir}/bin/${name}", &context),
        Some("/opt/msvc/14.38/bin/x64-Debug".to_string())
    );
}
