//! Shared test utilities for orchid-cli integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

/// Get a Command for the orchid binary.
///
/// # Panics
///
/// Panics if the orchid binary cannot be found. This should not happen
/// in a properly configured test environment.
#[allow(deprecated)]
pub fn orchid_cmd() -> Command {
    Command::cargo_bin("orchid").expect("orchid binary should exist")
}

/// `orchid` running in `project` with no API key, no colors and a config
/// path that does not exist, so the defaults apply.
pub fn orchid_in(project: &Path) -> Command {
    let mut cmd = orchid_cmd();
    cmd.current_dir(project)
        .env_remove("GEMINI_API_KEY")
        .env_remove("RUST_LOG")
        .env_remove("ORCHID_PROJECT")
        .env("ORCHID_CONFIG", project.join(".orchid-test-config.yaml"))
        .env("NO_COLOR", "1");
    cmd
}

/// A Next.js-like project with a `package.json` and one source file.
pub fn next_project() -> TempDir {
    let temp = TempDir::new().expect("create temp dir");
    fs::write(
        temp.path().join("package.json"),
        r#"{"name":"app","dependencies":{"next":"15.0.0"}}"#,
    )
    .expect("write package.json");
    fs::create_dir_all(temp.path().join("src/app")).expect("create src dir");
    fs::write(
        temp.path().join("src/app/page.tsx"),
        "export default function Page() { return <main>Songs</main>; }\n",
    )
    .expect("write page");
    temp
}

/// Mark a project initialized without indexing it.
pub fn mark_initialized(project: &Path) {
    fs::create_dir_all(project.join("orchid_db")).expect("create db dir");
}
