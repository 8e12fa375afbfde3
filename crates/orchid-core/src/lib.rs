//! # orchid-core
//!
//! **Orchid** – core engine library for the AI coding agent.
//!
//! This crate holds the domain logic: project scanning and indexing, request
//! classification, database setup, plan generation and the step-by-step
//! review that applies a plan. It never touches the terminal; every prompt
//! and message goes through the [`Interaction`] trait, which the `orchid`
//! CLI implements.
//!
//! ## Main Types
//!
//! - [`OrchidEngine`] – configuration plus model clients; opens a [`Session`]
//! - [`Workspace`] – a resolved project root on disk
//! - [`OrchidError`] – domain-specific error type
//!
//! ## Example
//!
//! ```ignore
//! use orchid_core::{OrchidEngine, Workspace};
//! use std::path::Path;
//!
//! let engine = OrchidEngine::with_defaults()?;
//! let workspace = Workspace::resolve(Path::new("."))?;
//!
//! let session = engine.open(workspace, false, &ui)?;
//! let report = session.init(&ui)?;
//! println!("Indexed {} snippets", report.indexed);
//! ```

// Modules
pub mod answer;
pub mod config;
pub mod constants;
pub mod context;
pub mod database;
pub mod db_adapter;
pub mod engine;
pub mod errors;
pub mod indexer;
pub mod intent;
pub mod interaction;
pub mod model_adapter;
pub mod plan;
pub mod prompts;
pub mod review;
pub mod scan;
pub mod status;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use answer::{answer_question, AnswerRequest};
pub use config::{api_key_from, load_env_files, GlobalConfig, ModelsConfig};
pub use constants::{
    should_ignore_dir, ALWAYS_IGNORED_DIRS, API_KEY_ENV, CONFIG_PATH_ENV, DEFAULT_CHUNK_SIZE,
    DEFAULT_DB_DIR, DEFAULT_SEARCH_LIMIT, DEFAULT_SRC_DIR, GLOBAL_CONFIG_FILENAME,
    ORCHID_HOME_DIR,
};
pub use context::{ProjectContext, STALE_INDEX_WARNING};
pub use database::{ProjectDependencies, DATABASE_CHOICES};
pub use engine::{OrchidEngine, RunOutcome, Session};
pub use errors::{IntoOrchidResult, OrchidError, OrchidResult};
pub use indexer::{InitReport, Indexer};
pub use intent::{DatabaseDecision, DatabaseKind, Intent, IntentDecision};
pub use interaction::{stage, Interaction};
pub use plan::{Plan, PlanAction, PlanStep};
pub use review::{CommandInstaller, DependencyInstaller, ReviewOutcome};
pub use scan::CodeChunk;
pub use status::StatusReport;
pub use workspace::Workspace;

// orchid-db / orchid-model adapters
pub use db_adapter::from_db_error;
pub use model_adapter::from_model_error;
