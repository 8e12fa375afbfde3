//! Integration tests for `orchid init` and `orchid run` paths that stop
//! before any model call.

mod common;

use predicates::prelude::*;
use std::fs;

use common::{mark_initialized, next_project, orchid_in};

#[test]
fn test_init_requires_api_key() {
    let project = next_project();

    orchid_in(project.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY is not set"))
        .stderr(predicate::str::contains("Hint:"));

    assert!(!project.path().join("orchid_db").exists());
}

#[test]
fn test_init_empty_project_succeeds() {
    let project = next_project();
    fs::remove_file(project.path().join("src/app/page.tsx")).unwrap();

    orchid_in(project.path())
        .env("GEMINI_API_KEY", "test-key")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Project Initialized Successfully!"))
        .stderr(predicate::str::contains("No code snippets found to index"));

    assert!(project.path().join("orchid_db").is_dir());
}

#[test]
fn test_run_requires_api_key() {
    let project = next_project();
    mark_initialized(project.path());

    orchid_in(project.path())
        .args(["run", "add a songs table"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY is not set"));
}

#[test]
fn test_run_requires_init() {
    let project = next_project();

    orchid_in(project.path())
        .env("GEMINI_API_KEY", "test-key")
        .args(["run", "add a songs table"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project not initialized"))
        .stderr(predicate::str::contains("orchid init"));
}

#[test]
fn test_run_with_empty_stdin_exits_cleanly() {
    let project = next_project();
    mark_initialized(project.path());

    orchid_in(project.path())
        .env("GEMINI_API_KEY", "test-key")
        .arg("run")
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Describe your task."))
        .stdout(predicate::str::contains("No task provided. Exiting."));
}

#[test]
fn test_run_empty_task_needs_no_key() {
    let project = next_project();

    orchid_in(project.path())
        .arg("run")
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No task provided. Exiting."))
        .stderr(predicate::str::contains("GEMINI_API_KEY").not());
}

#[test]
fn test_run_blank_task_argument_skips_init_check() {
    let project = next_project();

    orchid_in(project.path())
        .env("GEMINI_API_KEY", "test-key")
        .args(["run", "   "])
        .assert()
        .success()
        .stdout(predicate::str::contains("No task provided. Exiting."))
        .stderr(predicate::str::contains("Project not initialized").not());
}

#[test]
fn test_run_quiet_hides_info() {
    let project = next_project();
    mark_initialized(project.path());
    fs::write(project.path().join(".env"), "GEMINI_API_KEY=from-dotenv\n").unwrap();

    orchid_in(project.path())
        .args(["--quiet", "run"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("No task provided").not());
}
