//! Test: Preconditions - storage ownership and the initial container check

use crate::helpers::*;
use postdeploy::core::StepState;
use postdeploy::runtime::{CommandOutput, CommandSpec};
use std::sync::Arc;

/// Web container not up: abort after the ownership step, before any cache command
#[tokio::test(start_paused = true)]
async fn test_containers_not_up_aborts_before_cache_commands() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = test_config(dir.path(), true).to_plan();
    let runner = Arc::new(
        ScriptedRunner::healthy().on(" ps", CommandOutput::success(PS_APP_EXITED)),
    );

    let result = run_plan(&mut plan, Arc::clone(&runner), FixedIp(None)).await;

    println!("{}", result.summary());
    assert!(result.is_failed());
    assert_eq!(result.failed_step(), Some("check-containers"));
    assert!(matches!(
        result.step_state("fix-storage-ownership"),
        StepState::Succeeded { .. }
    ));

    let error = result.step_state("check-containers").error().unwrap();
    assert!(error.contains("'app'"), "error: {}", error);
    assert!(error.contains("docker compose up -d"), "error: {}", error);

    assert!(!runner.ran("artisan"));
    assert!(!runner.ran("redis-cli"));
    assert_eq!(result.pending_steps().len(), 14);
    assert!(result.banner_lines().is_none());
}

/// Workers sharing the web image do not stand in for the web container
#[tokio::test(start_paused = true)]
async fn test_sibling_on_same_image_does_not_satisfy_check() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = test_config(dir.path(), true).to_plan();
    let runner = Arc::new(
        ScriptedRunner::healthy().on(" ps", CommandOutput::success(PS_APP_EXITED_WORKERS_UP)),
    );

    let result = run_plan(&mut plan, Arc::clone(&runner), FixedIp(None)).await;

    assert!(result.is_failed(), "{}", result.summary());
    assert_eq!(result.failed_step(), Some("check-containers"));
    let error = result.step_state("check-containers").error().unwrap();
    assert!(error.contains("shop-app-1"), "error: {}", error);
    assert!(error.contains("Exited"), "error: {}", error);
    assert!(!runner.ran("artisan"));
    assert!(runner.ran("docker compose ps app"));
}

/// A relative project dir is not resolved twice by chown
#[tokio::test(start_paused = true)]
async fn test_relative_project_dir_chowns_absolute_paths() {
    let dir = tempfile::tempdir_in(".").unwrap();
    let cwd = std::env::current_dir().unwrap();
    let project = dir.path().strip_prefix(&cwd).unwrap_or(dir.path()).to_path_buf();
    assert!(project.is_relative());

    let mut plan = test_config(&project, true).to_plan();
    let runner = Arc::new(ScriptedRunner::healthy());

    let result = run_plan(&mut plan, Arc::clone(&runner), FixedIp(None)).await;

    assert!(result.is_success(), "{}", result.summary());
    let storage = project.join("storage").canonicalize().unwrap();
    let chowns: Vec<String> = runner
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("chown"))
        .collect();
    assert_eq!(chowns.len(), 2);
    let expected = |owner: &str, path: &std::path::Path| {
        CommandSpec::new("chown")
            .args(["-R", owner])
            .arg(path.to_string_lossy())
            .to_string()
    };
    assert_eq!(chowns[0], expected("1000:1000", &storage));
    assert_eq!(chowns[1], expected("999:999", &storage.join("redis")));
}

/// Service missing from `ps` output entirely
#[tokio::test(start_paused = true)]
async fn test_stack_down_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = test_config(dir.path(), false).to_plan();
    let runner = Arc::new(ScriptedRunner::healthy().on(
        " ps",
        CommandOutput::success("NAME   IMAGE   COMMAND   SERVICE   CREATED   STATUS   PORTS\n"),
    ));

    let result = run_plan(&mut plan, Arc::clone(&runner), FixedIp(None)).await;

    assert!(result.is_failed());
    assert_eq!(result.failed_step(), Some("check-containers"));
    assert!(result
        .step_state("check-containers")
        .error()
        .unwrap()
        .contains("not listed"));
}

/// The container runtime CLI itself is unavailable
#[tokio::test(start_paused = true)]
async fn test_container_query_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = test_config(dir.path(), false).to_plan();
    let runner = Arc::new(ScriptedRunner::healthy().unavailable(" ps"));

    let result = run_plan(&mut plan, Arc::clone(&runner), FixedIp(None)).await;

    assert!(result.is_failed());
    assert_eq!(result.failed_step(), Some("check-containers"));
    assert!(result
        .step_state("check-containers")
        .error()
        .unwrap()
        .starts_with("Could not query container state"));
    assert_eq!(runner.calls().len(), 1);
}

/// First run: no storage directory yet
#[tokio::test(start_paused = true)]
async fn test_missing_storage_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = test_config(dir.path(), false).to_plan();
    let runner = Arc::new(ScriptedRunner::healthy());

    let result = run_plan(&mut plan, Arc::clone(&runner), FixedIp(None)).await;

    assert!(result.is_success(), "{}", result.summary());
    assert!(matches!(
        result.step_state("fix-storage-ownership"),
        StepState::Skipped { .. }
    ));
    assert!(!runner.ran("chown"));
}

/// Storage exists but the cache service subpath does not
#[tokio::test(start_paused = true)]
async fn test_missing_cache_subpath_only_skips_nested_chown() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("storage")).unwrap();
    let mut plan = test_config(dir.path(), false).to_plan();
    let runner = Arc::new(ScriptedRunner::healthy());

    let result = run_plan(&mut plan, Arc::clone(&runner), FixedIp(None)).await;

    assert!(result.is_success());
    assert_eq!(runner.calls_containing("chown"), 1);
    assert!(runner.ran("chown -R 1000:1000"));
    assert!(!runner.ran("chown -R 999:999"));
}

/// chown is fail-fast like every other non-exempt step
#[tokio::test(start_paused = true)]
async fn test_chown_failure_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = test_config(dir.path(), true).to_plan();
    let runner = Arc::new(ScriptedRunner::healthy().failing(
        "chown",
        1,
        "chown: changing ownership of 'storage': Operation not permitted",
    ));

    let result = run_plan(&mut plan, Arc::clone(&runner), FixedIp(None)).await;

    assert!(result.is_failed());
    assert_eq!(result.failed_step(), Some("fix-storage-ownership"));
    assert!(result.failure_output().unwrap().contains("Operation not permitted"));
    assert!(!runner.ran(" ps"));
}
