//! Orchid engine: the orchestrator behind every CLI command.
//!
//! [`OrchidEngine`] owns the configuration and knows how to build the model
//! clients. [`OrchidEngine::open`] binds it to a project and yields a
//! [`Session`], which runs `init` and the interactive `start` flow.

use std::sync::Arc;

use orchid_model::{create_gemini_models, ChatModel, EmbeddingModel};
use serde::Serialize;

use crate::answer::{answer_question, AnswerRequest};
use crate::config::{load_env_files, GlobalConfig};
use crate::context::{format_snippets, load_context, load_user_files, ProjectContext};
use crate::database::{resolve_database, ProjectDependencies};
use crate::errors::{IntoOrchidResult, OrchidError, OrchidResult};
use crate::indexer::{InitReport, Indexer};
use crate::intent::{classify_database, classify_intent, DatabaseKind, Intent};
use crate::interaction::{stage, Interaction};
use crate::plan::request_plan;
use crate::prompts;
use crate::review::{review_plan, CommandInstaller, DependencyInstaller, ReviewOutcome};
use crate::status::StatusReport;
use crate::workspace::Workspace;

// ============================================================================
// RunOutcome
// ============================================================================

/// Result of one `start` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RunOutcome {
    /// The request was a question. `answer` is `None` when the model failed.
    Answered { answer: Option<String> },
    /// No usable plan came back from the model.
    NoPlan { database: DatabaseKind },
    /// A plan was produced and reviewed.
    Reviewed {
        database: DatabaseKind,
        review: ReviewOutcome,
    },
}

// ============================================================================
// OrchidEngine
// ============================================================================

/// Configuration plus optional pre-built model clients.
///
/// ```ignore
/// use orchid_core::{OrchidEngine, Workspace};
///
/// let engine = OrchidEngine::with_defaults()?;
/// let workspace = Workspace::resolve(Path::new("."))?;
/// let session = engine.open(workspace, true, &ui)?;
/// session.start("add a songs table", &[], &ui)?;
/// ```
pub struct OrchidEngine {
    config: GlobalConfig,
    models: Option<(Arc<dyn EmbeddingModel>, Arc<dyn ChatModel>)>,
    installer: Option<Arc<dyn DependencyInstaller + Send + Sync>>,
}

impl std::fmt::Debug for OrchidEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchidEngine")
            .field("config", &self.config)
            .field("custom_models", &self.models.is_some())
            .field("custom_installer", &self.installer.is_some())
            .finish()
    }
}

impl OrchidEngine {
    /// Engine over `~/.orchid/config.yaml`, or the defaults if absent.
    pub fn with_defaults() -> OrchidResult<Self> {
        Ok(Self::with_config(GlobalConfig::load_default()?))
    }

    pub fn with_config(config: GlobalConfig) -> Self {
        Self {
            config,
            models: None,
            installer: None,
        }
    }

    /// Use these clients instead of building Gemini ones from the API key.
    pub fn with_models(
        mut self,
        embedder: Arc<dyn EmbeddingModel>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        self.models = Some((embedder, chat));
        self
    }

    /// Use this installer instead of spawning `installCommand`.
    pub fn with_installer(mut self, installer: Arc<dyn DependencyInstaller + Send + Sync>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Bind the engine to `workspace`.
    ///
    /// Loads `.env`, requires `GEMINI_API_KEY` unless clients were injected,
    /// and with `require_initialized` refuses projects without a db dir. An
    /// initialized project also gets its index freshness checked.
    ///
    /// # Errors
    ///
    /// [`OrchidError::MissingApiKey`], [`OrchidError::NotInitialized`], or a
    /// model configuration error.
    pub fn open(
        &self,
        workspace: Workspace,
        require_initialized: bool,
        ui: &dyn Interaction,
    ) -> OrchidResult<Session> {
        load_env_files(workspace.root());

        let (embedder, chat) = match &self.models {
            Some((embedder, chat)) => (Arc::clone(embedder), Arc::clone(chat)),
            None => {
                let key = GlobalConfig::api_key()?;
                create_gemini_models(self.config.gemini_config(key)).into_orchid_result()?
            }
        };

        if require_initialized && !workspace.is_initialized(&self.config) {
            return Err(OrchidError::NotInitialized);
        }

        let installer = match &self.installer {
            Some(installer) => Arc::clone(installer),
            None => Arc::new(CommandInstaller::new(self.config.install_command.clone())),
        };

        tracing::info!(
            "Opened project at {} (chat model {})",
            workspace.root().display(),
            self.config.models.chat
        );
        let indexer = Indexer::new(workspace, self.config.clone(), embedder);
        let context = require_initialized.then(|| load_context(&indexer, ui));

        Ok(Session {
            config: self.config.clone(),
            indexer,
            chat,
            installer,
            context,
        })
    }

    /// Index and environment status for `workspace`. Needs no API access.
    pub fn status(&self, workspace: &Workspace) -> StatusReport {
        load_env_files(workspace.root());
        let api_key_set = self.models.is_some() || GlobalConfig::api_key().is_ok();
        StatusReport::collect(workspace, &self.config, api_key_set)
    }
}

// ============================================================================
// Session
// ============================================================================

/// An engine bound to one project with live model clients.
pub struct Session {
    config: GlobalConfig,
    indexer: Indexer,
    chat: Arc<dyn ChatModel>,
    installer: Arc<dyn DependencyInstaller + Send + Sync>,
    context: Option<ProjectContext>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("indexer", &self.indexer)
            .field("context", &self.context)
            .finish()
    }
}

impl Session {
    pub fn workspace(&self) -> &Workspace {
        self.indexer.workspace()
    }

    /// Freshness observed at open time, if the project was initialized.
    pub fn context(&self) -> Option<&ProjectContext> {
        self.context.as_ref()
    }

    /// Index the project from scratch.
    pub fn init(&self, ui: &dyn Interaction) -> OrchidResult<InitReport> {
        self.indexer.initialize_project(ui)
    }

    fn hash(&self) -> String {
        match &self.context {
            Some(ctx) => ctx.hash.clone(),
            None => self.indexer.current_hash(),
        }
    }

    /// Handle one user request: answer a question or plan and apply a build.
    ///
    /// # Errors
    ///
    /// Only local failures (prompting, `package.json`, writing `.env`) are
    /// errors. Model failures are reported through `ui` and end the run.
    pub fn start(
        &self,
        query: &str,
        user_files: &[String],
        ui: &dyn Interaction,
    ) -> OrchidResult<RunOutcome> {
        let models = &self.config.models;
        let hash = self.hash();

        let decision = classify_intent(self.chat.as_ref(), &models.classifier, query, ui);
        if decision.intent == Intent::Question {
            let request = AnswerRequest {
                query,
                user_files,
                hash: &hash,
                search_limit: self.config.search_limit,
                model: &models.chat,
            };
            let answer = answer_question(&request, &self.indexer, self.chat.as_ref(), ui);
            return Ok(RunOutcome::Answered { answer });
        }

        let classified =
            classify_database(self.chat.as_ref(), &models.database_classifier, query, ui);

        ui.think("Analyzing project dependencies...");
        let deps = ProjectDependencies::load(&self.workspace().package_json())?;
        if deps.is_none() {
            ui.warn("package.json not found.");
        }
        let database = resolve_database(classified.kind, deps.as_ref(), self.workspace(), ui)?;

        ui.think("Searching codebase for relevant context...");
        ui.progress(stage::SEARCHING, 0, 1);
        let chunks = self
            .indexer
            .search(&hash, query, self.config.search_limit, ui);
        ui.progress(stage::SEARCHING, 1, 1);

        ui.think("Loading content from user-specified files...");
        let user_context = load_user_files(self.workspace(), user_files, ui);
        let prompt = prompts::plan_prompt(
            query,
            database.label(),
            &user_context,
            &format_snippets(&chunks),
        );

        let Some(plan) = request_plan(
            self.chat.as_ref(),
            &models.chat,
            &prompt,
            &self.config.retry,
            ui,
        ) else {
            ui.error("Agent could not complete the task.");
            return Ok(RunOutcome::NoPlan { database });
        };

        let review = review_plan(&plan, self.workspace(), self.installer.as_ref(), ui)?;
        tracing::info!("Review finished: {:?}", review);
        if review.is_complete() && !plan.steps().is_empty() {
            ui.success("All tasks completed successfully!");
        }
        Ok(RunOutcome::Reviewed { database, review })
    }
}
