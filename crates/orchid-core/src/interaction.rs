//! User-facing seam between the engine and whatever front end drives it.
//!
//! `orchid-core` never prints or reads the terminal. Status messages,
//! confirmations and plan display all go through [`Interaction`]; the CLI
//! implements it with styled output and dialoguer prompts.

use crate::errors::OrchidError;
use crate::plan::{Plan, PlanStep};

/// Named stages reported through [`Interaction::progress`].
pub mod stage {
    pub const ANALYZING_FILES: &str = "Analyzing files";
    pub const EMBEDDING: &str = "Embedding snippets";
    pub const STORING: &str = "Storing embeddings";
    pub const SEARCHING: &str = "Searching codebase";
}

pub trait Interaction {
    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// The agent is reasoning (classification, planning).
    fn think(&self, message: &str);

    /// The agent is about to act on the project.
    fn act(&self, message: &str);

    fn info(&self, message: &str);

    fn success(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    // ------------------------------------------------------------------
    // Prompts
    // ------------------------------------------------------------------

    fn confirm(&self, message: &str, default: bool) -> Result<bool, OrchidError>;

    /// Index of the chosen option.
    fn select(&self, message: &str, options: &[&str]) -> Result<usize, OrchidError>;

    fn input(&self, message: &str) -> Result<String, OrchidError>;

    // ------------------------------------------------------------------
    // Display
    // ------------------------------------------------------------------

    /// Summary of every step before review begins.
    fn show_plan(&self, plan: &Plan);

    /// One step under review; `index` is 1-based.
    fn show_step(&self, index: usize, total: usize, step: &PlanStep);

    fn show_answer(&self, answer: &str);

    /// Values about to be written to `.env`.
    fn show_env(&self, values: &[(String, String)]);

    /// One line of package manager output.
    fn install_output(&self, line: &str);

    /// `done` of `total` units finished in `stage`. `done == total` closes it.
    fn progress(&self, stage: &str, done: usize, total: usize);
}
