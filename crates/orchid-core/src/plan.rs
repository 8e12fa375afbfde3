//! Build plans returned by the chat model.
//!
//! The model is asked for a bare JSON object but regularly wraps it in
//! Markdown fences or prose, so [`extract_plan`] tries several increasingly
//! loose ways of finding it. [`request_plan`] owns the retry loop around the
//! generation call.

use std::sync::LazyLock;
use std::thread;

use orchid_model::{ChatModel, RetryPolicy};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{IntoOrchidResult, OrchidError};
use crate::interaction::Interaction;

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("json fence regex is valid")
});

static OUTER_BRACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("brace regex is valid"));

// ============================================================================
// Types
// ============================================================================

/// What a step does to its file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlanAction {
    CreateFile,
    UpdateFile,
    /// Any other label; kept for display, applied like a write.
    Other(String),
}

impl PlanAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateFile => "CREATE_FILE",
            Self::UpdateFile => "UPDATE_FILE",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PlanAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CREATE_FILE" => Self::CreateFile,
            "UPDATE_FILE" => Self::UpdateFile,
            _ => Self::Other(value),
        }
    }
}

impl From<PlanAction> for String {
    fn from(value: PlanAction) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for PlanAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file change proposed by the model. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(default)]
    pub action: Option<PlanAction>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub thought: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl PlanStep {
    /// `(action, path, code)` when all three are present and non-empty.
    pub fn parts(&self) -> Option<(&PlanAction, &str, &str)> {
        let action = self.action.as_ref().filter(|a| !a.as_str().is_empty())?;
        let path = self.path.as_deref().filter(|p| !p.is_empty())?;
        let code = self.code.as_deref().filter(|c| !c.is_empty())?;
        Some((action, path, code))
    }

    pub fn is_valid(&self) -> bool {
        self.parts().is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// npm packages to install before writing files.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub plan: Vec<PlanStep>,
}

/// `null` reads as an empty list.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Plan {
    /// Nothing to install and nothing to write.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.plan.is_empty()
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.plan
    }

    /// Trim names, drop blanks and repeats, keep first-seen order.
    pub fn dedup_dependencies(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.dependencies = std::mem::take(&mut self.dependencies)
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty() && seen.insert(d.clone()))
            .collect();
    }
}

// ============================================================================
// Extraction
// ============================================================================

fn parse_object(text: &str) -> Option<Plan> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Pull the plan object out of a model response.
///
/// Tried in order: the whole text, the text after a leading `data:`, the
/// first ```` ```json ```` fence, the outermost `{...}` span, and everything
/// from the first `{`. Returns `None` if none of them is a JSON object.
pub fn extract_plan(raw: &str) -> Option<Plan> {
    let mut plan = extract_object(raw)?;
    plan.dedup_dependencies();
    Some(plan)
}

fn extract_object(raw: &str) -> Option<Plan> {
    let raw = raw.trim();
    if let Some(plan) = parse_object(raw) {
        return Some(plan);
    }

    let raw = match raw.strip_prefix("data:") {
        Some(rest) => {
            let rest = rest.trim();
            if let Some(plan) = parse_object(rest) {
                return Some(plan);
            }
            rest
        }
        None => raw,
    };

    if let Some(plan) = JSON_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_object(m.as_str()))
    {
        return Some(plan);
    }

    if let Some(plan) = OUTER_BRACES
        .find(raw)
        .and_then(|m| parse_object(m.as_str()))
    {
        return Some(plan);
    }

    raw.find('{').and_then(|idx| parse_object(&raw[idx..]))
}

// ============================================================================
// Generation
// ============================================================================

/// Send `prompt` to `model` until a plan comes back.
///
/// Rate limits back off per `retry`; malformed replies and transport errors
/// retry at once. Any other HTTP error ends the loop. `None` means no plan.
pub fn request_plan(
    chat: &dyn ChatModel,
    model: &str,
    prompt: &str,
    retry: &RetryPolicy,
    ui: &dyn Interaction,
) -> Option<Plan> {
    let max = retry.max_retries;

    for attempt in 0..max {
        ui.think("Orchid is thinking...");
        match chat.generate(model, prompt).into_orchid_result() {
            Ok(text) => match extract_plan(&text) {
                Some(plan) => {
                    tracing::info!(
                        "Plan received: {} steps, {} dependencies",
                        plan.plan.len(),
                        plan.dependencies.len()
                    );
                    return Some(plan);
                }
                None => {
                    tracing::debug!("Unparseable plan response: {}", text);
                    ui.error("Response did not contain valid JSON; retrying…");
                }
            },
            Err(e) if e.is_rate_limited() => {
                ui.warn(&format!(
                    "Rate limit hit. Waiting for {}s... ({}/{})",
                    retry.wait_units(attempt),
                    attempt + 1,
                    max
                ));
                thread::sleep(retry.wait_for_attempt(attempt));
            }
            Err(e @ (OrchidError::ModelRequest { .. } | OrchidError::ModelResponse { .. })) => {
                ui.error(&format!("HTTP or parsing error: {} - retrying…", e));
            }
            Err(e @ OrchidError::ModelHttp { .. }) => {
                ui.error(&format!("HTTP error: {}", e));
                return None;
            }
            Err(e) => {
                ui.error(&format!("Error interacting with Gemini: {}", e));
                return None;
            }
        }
    }

    ui.error(&format!(
        "Failed to get a response from Gemini after {} retries.",
        max
    ));
    None
}
