//! Request classification: question vs build, and which database.
//!
//! Both classifiers ask for a label on the first line and a one-sentence
//! reason on the second. Anything unexpected falls back to a safe default
//! instead of failing the run.

use orchid_model::ChatModel;
use serde::{Deserialize, Serialize};

use crate::errors::IntoOrchidResult;
use crate::interaction::Interaction;
use crate::prompts;

const NO_REASON: &str = "No reason returned.";
const UNEXPECTED_LABEL: &str = "Model returned unexpected label.";
const DEFAULTED: &str = "Defaulted due to error.";

fn response_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

// ============================================================================
// Intent
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BuildRequest,
    Question,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuildRequest => "build_request",
            Self::Question => "question",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentDecision {
    pub intent: Intent,
    pub reason: String,
}

/// Parse the classifier's two-line answer. The label is case-insensitive.
pub fn parse_intent_response(text: &str) -> IntentDecision {
    let lines = response_lines(text);
    let Some(first) = lines.first() else {
        return IntentDecision {
            intent: Intent::BuildRequest,
            reason: NO_REASON.to_string(),
        };
    };

    let reason = lines.get(1).unwrap_or(&NO_REASON).to_string();
    match first.to_lowercase().as_str() {
        "build_request" => IntentDecision {
            intent: Intent::BuildRequest,
            reason,
        },
        "question" => IntentDecision {
            intent: Intent::Question,
            reason,
        },
        _ => IntentDecision {
            intent: Intent::BuildRequest,
            reason: UNEXPECTED_LABEL.to_string(),
        },
    }
}

/// Decide whether `query` asks a question or requests a build.
pub fn classify_intent(
    chat: &dyn ChatModel,
    model: &str,
    query: &str,
    ui: &dyn Interaction,
) -> IntentDecision {
    ui.think("Classifying user intent...");
    match chat
        .generate(model, &prompts::intent_prompt(query))
        .into_orchid_result()
    {
        Ok(text) => {
            let decision = parse_intent_response(&text);
            tracing::info!("Intent: {} ({})", decision.intent, decision.reason);
            ui.info(&format!("Got it, {}", decision.reason));
            decision
        }
        Err(e) => {
            ui.error(&format!(
                "Could not classify intent: {}. Defaulting to build_request.",
                e
            ));
            IntentDecision {
                intent: Intent::BuildRequest,
                reason: DEFAULTED.to_string(),
            }
        }
    }
}

// ============================================================================
// Database
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseKind {
    #[serde(rename = "SQLite")]
    Sqlite,
    #[serde(rename = "MongoDB")]
    MongoDb,
    Supabase,
    Unknown,
    Unsupported,
}

impl DatabaseKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::MongoDb => "MongoDB",
            Self::Supabase => "Supabase",
            Self::Unknown => "Unknown",
            Self::Unsupported => "Unsupported",
        }
    }

    /// Exact, case-sensitive label match.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "SQLite" => Some(Self::Sqlite),
            "MongoDB" => Some(Self::MongoDb),
            "Supabase" => Some(Self::Supabase),
            "Unknown" => Some(Self::Unknown),
            "Unsupported" => Some(Self::Unsupported),
            _ => None,
        }
    }

    /// Needs a `DATABASE_URL` in `.env`.
    pub fn needs_connection_string(&self) -> bool {
        matches!(self, Self::MongoDb | Self::Supabase)
    }
}

impl std::fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseDecision {
    pub kind: DatabaseKind,
    pub reason: String,
}

pub fn parse_database_response(text: &str) -> DatabaseDecision {
    let lines = response_lines(text);
    let Some(first) = lines.first() else {
        return DatabaseDecision {
            kind: DatabaseKind::Unknown,
            reason: NO_REASON.to_string(),
        };
    };

    match DatabaseKind::from_label(first) {
        Some(kind) => DatabaseDecision {
            kind,
            reason: lines.get(1).unwrap_or(&NO_REASON).to_string(),
        },
        None => DatabaseDecision {
            kind: DatabaseKind::Unknown,
            reason: UNEXPECTED_LABEL.to_string(),
        },
    }
}

/// Work out which database the task wants.
pub fn classify_database(
    chat: &dyn ChatModel,
    model: &str,
    task: &str,
    ui: &dyn Interaction,
) -> DatabaseDecision {
    ui.think("Analyzing prompt for specific database request...");
    match chat
        .generate(model, &prompts::database_prompt(task))
        .into_orchid_result()
    {
        Ok(text) => {
            let decision = parse_database_response(&text);
            tracing::info!("Database: {} ({})", decision.kind, decision.reason);
            ui.info(&format!("Perfect, {}", decision.reason));
            decision
        }
        Err(e) => {
            ui.error(&format!(
                "Could not classify database intent: {}. Defaulting to Unknown.",
                e
            ));
            DatabaseDecision {
                kind: DatabaseKind::Unknown,
                reason: DEFAULTED.to_string(),
            }
        }
    }
}
