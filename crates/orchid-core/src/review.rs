//! Interactive plan review and apply.
//!
//! The user confirms the plan, optionally installs its dependencies, then
//! approves steps one by one. Approved changes are staged in memory and only
//! written once review ends. Cancelling mid-way offers to keep what was
//! already approved.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use serde::Serialize;

use crate::errors::{OrchidError, OrchidResult};
use crate::interaction::Interaction;
use crate::plan::Plan;
use crate::workspace::Workspace;

// ============================================================================
// DependencyInstaller
// ============================================================================

/// Installs npm packages into the project.
pub trait DependencyInstaller {
    /// Run the install and stream output lines to `ui`. Returns the exit code.
    fn install(&self, root: &Path, packages: &[String], ui: &dyn Interaction) -> OrchidResult<i32>;
}

/// Spawns the configured package manager command, e.g.
/// `npm install --legacy-peer-deps <packages…>`.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    command: String,
}

impl CommandInstaller {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn build_command(&self, root: &Path, packages: &[String]) -> OrchidResult<Command> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| OrchidError::InvalidConfiguration {
            message: "installCommand is empty".to_string(),
            hint: "Set installCommand, e.g. `npm install --legacy-peer-deps`".to_string(),
        })?;

        // npm is a .cmd shim on Windows and cannot be spawned directly.
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(program);
            cmd
        } else {
            Command::new(program)
        };
        cmd.args(parts)
            .args(packages)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        Ok(cmd)
    }
}

/// Send each line of `pipe` to `tx` until EOF.
fn forward_lines<R: Read + Send + 'static>(pipe: R, tx: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(pipe).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    })
}

impl DependencyInstaller for CommandInstaller {
    fn install(&self, root: &Path, packages: &[String], ui: &dyn Interaction) -> OrchidResult<i32> {
        let mut child = self.build_command(root, packages)?.spawn()?;
        tracing::info!("Running `{} {}`", self.command, packages.join(" "));

        // Both pipes feed one channel so lines arrive in the order written.
        let (tx, rx) = mpsc::channel::<String>();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        for line in rx {
            ui.install_output(&line);
        }
        for reader in readers {
            if reader.join().is_err() {
                tracing::warn!("Installer output reader panicked");
            }
        }

        let status = child.wait()?;
        Ok(status.code().unwrap_or(-1))
    }
}

// ============================================================================
// ReviewOutcome
// ============================================================================

/// How a review ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReviewOutcome {
    /// The plan was empty.
    Aborted,
    /// The user declined to review the plan.
    Cancelled,
    /// Dependency installation failed; nothing was written.
    InstallFailed { exit_code: Option<i32> },
    /// The user cancelled and chose not to keep approved changes.
    Discarded,
    /// Review finished; approved changes were written.
    Applied { written: Vec<String>, failed: Vec<String> },
    /// The user cancelled mid-way but kept the changes approved before that.
    PartiallyApplied { written: Vec<String>, failed: Vec<String> },
}

impl ReviewOutcome {
    /// Files written to disk.
    pub fn written(&self) -> &[String] {
        match self {
            Self::Applied { written, .. } | Self::PartiallyApplied { written, .. } => written,
            _ => &[],
        }
    }

    /// Review reached the end without cancellation or failure.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Applied { failed, .. } if failed.is_empty())
    }
}

/// Approved changes in first-approval order; re-approving a path replaces
/// its content in place.
#[derive(Debug, Default)]
struct StagedChanges {
    entries: Vec<(String, String)>,
}

impl StagedChanges {
    fn stage(&mut self, path: &str, code: &str) {
        match self.entries.iter_mut().find(|(p, _)| p == path) {
            Some(entry) => entry.1 = code.to_string(),
            None => self.entries.push((path.to_string(), code.to_string())),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Review
// ============================================================================

/// Walk the user through `plan` and apply what they approve.
pub fn review_plan(
    plan: &Plan,
    workspace: &Workspace,
    installer: &dyn DependencyInstaller,
    ui: &dyn Interaction,
) -> OrchidResult<ReviewOutcome> {
    if plan.is_empty() {
        ui.error("No valid plan received. Aborting.");
        return Ok(ReviewOutcome::Aborted);
    }

    ui.show_plan(plan);
    if !ui.confirm(
        "Do you want to proceed with reviewing this plan step-by-step?",
        true,
    )? {
        ui.warn("Operation cancelled by user.");
        return Ok(ReviewOutcome::Cancelled);
    }

    if !plan.dependencies.is_empty() {
        if let Some(outcome) = install_dependencies(plan, workspace, installer, ui)? {
            return Ok(outcome);
        }
    }

    let steps = plan.steps();
    let total = steps.len();
    let mut staged = StagedChanges::default();
    let mut cancelled = false;

    for (i, step) in steps.iter().enumerate() {
        ui.show_step(i + 1, total, step);
        let Some((action, path, code)) = step.parts() else {
            ui.error("Skipping invalid step.");
            continue;
        };
        tracing::debug!("Reviewing {} {}", action, path);

        if ui.confirm("Apply this change?", true)? {
            staged.stage(path, code);
        } else {
            cancelled = true;
            break;
        }
    }

    if cancelled {
        if staged.is_empty() {
            ui.warn("All changes have been discarded.");
            return Ok(ReviewOutcome::Discarded);
        }
        let keep = ui.confirm(
            &format!(
                "You cancelled the operation. Apply the {} changes you already approved?",
                staged.len()
            ),
            false,
        )?;
        if !keep {
            ui.warn("All changes have been discarded.");
            return Ok(ReviewOutcome::Discarded);
        }
        ui.act("Applying previously approved changes...");
        let (written, failed) = commit(&staged, workspace, ui);
        return Ok(ReviewOutcome::PartiallyApplied { written, failed });
    }

    let (written, failed) = commit(&staged, workspace, ui);
    Ok(ReviewOutcome::Applied { written, failed })
}

/// `Some(outcome)` stops the review.
fn install_dependencies(
    plan: &Plan,
    workspace: &Workspace,
    installer: &dyn DependencyInstaller,
    ui: &dyn Interaction,
) -> OrchidResult<Option<ReviewOutcome>> {
    ui.act(&format!(
        "Plan requires new dependencies: {}",
        plan.dependencies.join(", ")
    ));
    if !ui.confirm("Install them with 'npm install'?", true)? {
        ui.warn("Skipping dependency installation.");
        return Ok(None);
    }

    match installer.install(workspace.root(), &plan.dependencies, ui) {
        Ok(0) => {
            ui.success("Dependencies installed.");
            Ok(None)
        }
        Ok(code) => {
            ui.error(&format!(
                "Installation failed with exit code {}. Aborting.",
                code
            ));
            Ok(Some(ReviewOutcome::InstallFailed {
                exit_code: Some(code),
            }))
        }
        Err(e) => {
            ui.error(&format!("Error installing dependencies: {}", e));
            Ok(Some(ReviewOutcome::InstallFailed { exit_code: None }))
        }
    }
}

/// Write staged changes; returns `(written, failed)` paths.
fn commit(
    staged: &StagedChanges,
    workspace: &Workspace,
    ui: &dyn Interaction,
) -> (Vec<String>, Vec<String>) {
    let mut written = Vec::new();
    let mut failed = Vec::new();
    if staged.is_empty() {
        return (written, failed);
    }

    ui.act("Committing all approved changes to the filesystem...");
    for (path, code) in &staged.entries {
        match write_file(workspace, path, code) {
            Ok(()) => {
                ui.success(&format!("Wrote changes to {}", path));
                written.push(path.clone());
            }
            Err(e) => {
                ui.error(&format!("Error writing file {}: {}", path, e));
                failed.push(path.clone());
            }
        }
    }
    (written, failed)
}

fn write_file(workspace: &Workspace, path: &str, code: &str) -> OrchidResult<()> {
    let target = workspace.resolve_path(path)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, code)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanAction, PlanStep};
    use crate::test_support::{Answer, FakeInstaller, ScriptedInteraction};
    use tempfile::TempDir;

    fn step(path: &str, code: &str) -> PlanStep {
        PlanStep {
            action: Some(PlanAction::CreateFile),
            path: Some(path.into()),
            thought: Some("because".into()),
            code: Some(code.into()),
        }
    }

    fn plan(deps: &[&str], steps: Vec<PlanStep>) -> Plan {
        Plan {
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            plan: steps,
        }
    }

    fn workspace() -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::from_root(tmp.path()).unwrap();
        (tmp, ws)
    }

    #[test]
    fn test_empty_plan_aborts() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::new();
        let outcome = review_plan(&Plan::default(), &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert_eq!(outcome, ReviewOutcome::Aborted);
        assert!(ui.saw("No valid plan received. Aborting."));
    }

    #[test]
    fn test_declining_review_cancels() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::with_answers(vec![Answer::Confirm(false)]);
        let p = plan(&[], vec![step("a.ts", "a")]);
        let outcome = review_plan(&p, &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert_eq!(outcome, ReviewOutcome::Cancelled);
        assert!(!ws.root().join("a.ts").exists());
    }

    #[test]
    fn test_full_approval_writes_files() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::with_answers(vec![
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Confirm(true),
        ]);
        let p = plan(
            &[],
            vec![
                step("src/db/schema.ts", "schema"),
                PlanStep::default(),
                step("src/app/api/songs/route.ts", "route"),
            ],
        );
        let outcome = review_plan(&p, &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert!(outcome.is_complete());
        assert_eq!(
            outcome.written(),
            ["src/db/schema.ts", "src/app/api/songs/route.ts"]
        );
        assert!(ui.saw("Skipping invalid step."));
        assert_eq!(
            fs::read_to_string(ws.root().join("src/app/api/songs/route.ts")).unwrap(),
            "route"
        );
    }

    #[test]
    fn test_later_step_overwrites_same_path() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::with_answers(vec![
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Confirm(true),
        ]);
        let p = plan(&[], vec![step("a.ts", "first"), step("a.ts", "second")]);
        let outcome = review_plan(&p, &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert_eq!(outcome.written(), ["a.ts"]);
        assert_eq!(fs::read_to_string(ws.root().join("a.ts")).unwrap(), "second");
    }

    #[test]
    fn test_cancel_then_keep_applies_partially() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::with_answers(vec![
            Answer::Confirm(true),  // review
            Answer::Confirm(true),  // step 1
            Answer::Confirm(false), // step 2
            Answer::Confirm(true),  // keep approved
        ]);
        let p = plan(&[], vec![step("a.ts", "a"), step("b.ts", "b"), step("c.ts", "c")]);
        let outcome = review_plan(&p, &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert_eq!(
            outcome,
            ReviewOutcome::PartiallyApplied {
                written: vec!["a.ts".into()],
                failed: vec![],
            }
        );
        assert!(ui.saw("Apply the 1 changes you already approved?"));
        assert!(!ws.root().join("b.ts").exists());
    }

    #[test]
    fn test_cancel_then_discard() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::with_answers(vec![
            Answer::Confirm(true),
            Answer::Confirm(true),
            Answer::Confirm(false),
            Answer::Confirm(false),
        ]);
        let p = plan(&[], vec![step("a.ts", "a"), step("b.ts", "b")]);
        let outcome = review_plan(&p, &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert_eq!(outcome, ReviewOutcome::Discarded);
        assert!(!ws.root().join("a.ts").exists());
    }

    #[test]
    fn test_cancel_first_step_discards_without_asking() {
        let (_tmp, ws) = workspace();
        let ui =
            ScriptedInteraction::with_answers(vec![Answer::Confirm(true), Answer::Confirm(false)]);
        let p = plan(&[], vec![step("a.ts", "a")]);
        let outcome = review_plan(&p, &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert_eq!(outcome, ReviewOutcome::Discarded);
        assert!(ui.saw("All changes have been discarded."));
    }

    #[test]
    fn test_install_failure_stops_review() {
        let (_tmp, ws) = workspace();
        let ui =
            ScriptedInteraction::with_answers(vec![Answer::Confirm(true), Answer::Confirm(true)]);
        let installer = FakeInstaller::exit(1);
        let p = plan(&["pg"], vec![step("a.ts", "a")]);
        let outcome = review_plan(&p, &ws, &installer, &ui).unwrap();
        assert_eq!(outcome, ReviewOutcome::InstallFailed { exit_code: Some(1) });
        assert!(ui.saw("Installation failed with exit code 1. Aborting."));
        assert_eq!(installer.installed(), vec![vec!["pg".to_string()]]);
        assert!(!ws.root().join("a.ts").exists());
    }

    #[test]
    fn test_skipping_install_continues() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::with_answers(vec![
            Answer::Confirm(true),
            Answer::Confirm(false),
            Answer::Confirm(true),
        ]);
        let installer = FakeInstaller::ok();
        let p = plan(&["pg", "drizzle-orm"], vec![step("a.ts", "a")]);
        let outcome = review_plan(&p, &ws, &installer, &ui).unwrap();
        assert!(outcome.is_complete());
        assert!(installer.installed().is_empty());
        assert!(ui.saw("Plan requires new dependencies: pg, drizzle-orm"));
        assert!(ui.saw("Skipping dependency installation."));
    }

    #[test]
    fn test_escaping_path_fails_without_writing() {
        let (_tmp, ws) = workspace();
        let ui =
            ScriptedInteraction::with_answers(vec![Answer::Confirm(true), Answer::Confirm(true)]);
        let p = plan(&[], vec![step("../evil.ts", "x")]);
        let outcome = review_plan(&p, &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert_eq!(
            outcome,
            ReviewOutcome::Applied {
                written: vec![],
                failed: vec!["../evil.ts".into()],
            }
        );
        assert!(ui.saw("Error writing file ../evil.ts"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_installer_streams_output() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::new();
        let code = CommandInstaller::new("echo installing")
            .install(ws.root(), &["pg".into()], &ui)
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(ui.install_lines(), vec!["installing pg"]);

        let code = CommandInstaller::new("false")
            .install(ws.root(), &[], &ui)
            .unwrap();
        assert_ne!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_installer_merges_streams_in_arrival_order() {
        let (_tmp, ws) = workspace();
        let script = ws.root().join("install.sh");
        fs::write(
            &script,
            "#!/bin/sh\necho first-err >&2\nsleep 0.2\necho second-out\nsleep 0.2\necho third-err >&2\n",
        )
        .unwrap();

        let ui = ScriptedInteraction::new();
        let code = CommandInstaller::new(format!("sh {}", script.display()))
            .install(ws.root(), &["pg".into()], &ui)
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(ui.install_lines(), vec!["first-err", "second-out", "third-err"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dir_cannot_escape_project() {
        let (_tmp, ws) = workspace();
        let outside = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), ws.root().join("link")).unwrap();

        let ui =
            ScriptedInteraction::with_answers(vec![Answer::Confirm(true), Answer::Confirm(true)]);
        let p = plan(&[], vec![step("link/evil.ts", "x")]);
        let outcome = review_plan(&p, &ws, &FakeInstaller::ok(), &ui).unwrap();
        assert_eq!(
            outcome,
            ReviewOutcome::Applied {
                written: vec![],
                failed: vec!["link/evil.ts".into()],
            }
        );
        assert!(!outside.path().join("evil.ts").exists());
    }

    #[test]
    fn test_command_installer_spawn_error() {
        let (_tmp, ws) = workspace();
        let ui = ScriptedInteraction::new();
        assert!(CommandInstaller::new("")
            .install(ws.root(), &[], &ui)
            .is_err());
        #[cfg(unix)]
        assert!(CommandInstaller::new("definitely-not-a-real-binary-xyz")
            .install(ws.root(), &[], &ui)
            .is_err());
    }
}
