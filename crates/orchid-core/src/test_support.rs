//! In-process fakes for the model, installer and user seams.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use orchid_model::{ChatModel, EmbeddingModel, EmbeddingTask, ModelError, ModelResult};

use crate::config::GlobalConfig;
use crate::errors::{OrchidError, OrchidResult};
use crate::interaction::Interaction;
use crate::plan::{Plan, PlanStep};
use crate::review::DependencyInstaller;

/// Defaults with the file backend and no retry sleeps.
pub fn test_config() -> GlobalConfig {
    let mut config = GlobalConfig {
        vector_backend: "simple".to_string(),
        ..GlobalConfig::default()
    };
    config.retry.wait_unit = std::time::Duration::ZERO;
    config
}

// ============================================================================
// FakeEmbedder
// ============================================================================

const FAKE_DIM: usize = 256;

/// Bag-of-words hashing embedder: texts sharing words score higher.
#[derive(Debug, Default)]
pub struct FakeEmbedder {
    fail: bool,
}

impl FakeEmbedder {
    pub fn failing() -> Self {
        Self { fail: true }
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; FAKE_DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // FNV-1a
            let mut h: u64 = 0xcbf29ce484222325;
            for b in word.to_lowercase().bytes() {
                h ^= b as u64;
                h = h.wrapping_mul(0x100000001b3);
            }
            v[(h % FAKE_DIM as u64) as usize] += 1.0;
        }
        // Keeps empty texts from producing a zero vector.
        v[0] += 0.01;
        v
    }
}

impl EmbeddingModel for FakeEmbedder {
    fn embed(&self, texts: &[&str], _task: EmbeddingTask) -> ModelResult<Vec<Vec<f32>>> {
        if self.fail {
            return Err(ModelError::embedding_failed("fake", "embedding service down"));
        }
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_id(&self) -> &str {
        "fake-embedder"
    }
}

// ============================================================================
// ScriptedChat
// ============================================================================

/// Returns queued replies in order; records every call.
#[derive(Debug)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<ModelResult<String>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<ModelResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn models(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

impl ChatModel for ScriptedChat {
    fn generate(&self, model: &str, prompt: &str) -> ModelResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::request("scripted", "no reply queued")))
    }
}

// ============================================================================
// ScriptedInteraction
// ============================================================================

/// One queued user response.
#[derive(Debug, Clone)]
pub enum Answer {
    Confirm(bool),
    Select(usize),
    Input(String),
}

/// Replays queued answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    answers: Mutex<VecDeque<Answer>>,
    messages: Mutex<Vec<String>>,
    answers_shown: Mutex<Vec<String>>,
    install_lines: Mutex<Vec<String>>,
    progress: Mutex<Vec<(String, usize, usize)>>,
    plans_shown: Mutex<usize>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: Vec<Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            ..Self::default()
        }
    }

    fn record(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn next(&self, prompt: &str) -> OrchidResult<Answer> {
        self.record(prompt);
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| OrchidError::Prompt(format!("no scripted answer for `{}`", prompt)))
    }

    /// Any message or prompt contained `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }

    pub fn answers(&self) -> Vec<String> {
        self.answers_shown.lock().unwrap().clone()
    }

    pub fn install_lines(&self) -> Vec<String> {
        self.install_lines.lock().unwrap().clone()
    }

    pub fn plans_shown(&self) -> usize {
        *self.plans_shown.lock().unwrap()
    }

    pub fn progress_reached(&self, stage: &str, done: usize) -> bool {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .any(|(s, d, _)| s == stage && *d == done)
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

impl Interaction for ScriptedInteraction {
    fn think(&self, message: &str) {
        self.record(message);
    }

    fn act(&self, message: &str) {
        self.record(message);
    }

    fn info(&self, message: &str) {
        self.record(message);
    }

    fn success(&self, message: &str) {
        self.record(message);
    }

    fn warn(&self, message: &str) {
        self.record(message);
    }

    fn error(&self, message: &str) {
        self.record(message);
    }

    fn confirm(&self, message: &str, _default: bool) -> OrchidResult<bool> {
        match self.next(message)? {
            Answer::Confirm(b) => Ok(b),
            other => Err(OrchidError::Prompt(format!("expected confirm, got {:?}", other))),
        }
    }

    fn select(&self, message: &str, options: &[&str]) -> OrchidResult<usize> {
        match self.next(message)? {
            Answer::Select(i) if i < options.len() => Ok(i),
            other => Err(OrchidError::Prompt(format!("expected select, got {:?}", other))),
        }
    }

    fn input(&self, message: &str) -> OrchidResult<String> {
        match self.next(message)? {
            Answer::Input(s) => Ok(s),
            other => Err(OrchidError::Prompt(format!("expected input, got {:?}", other))),
        }
    }

    fn show_plan(&self, _plan: &Plan) {
        *self.plans_shown.lock().unwrap() += 1;
    }

    fn show_step(&self, index: usize, total: usize, _step: &PlanStep) {
        self.record(&format!("Step {}/{}", index, total));
    }

    fn show_answer(&self, answer: &str) {
        self.answers_shown.lock().unwrap().push(answer.to_string());
    }

    fn show_env(&self, values: &[(String, String)]) {
        for (k, v) in values {
            self.record(&format!("{}={}", k, v));
        }
    }

    fn install_output(&self, line: &str) {
        self.install_lines.lock().unwrap().push(line.to_string());
    }

    fn progress(&self, stage: &str, done: usize, total: usize) {
        self.progress
            .lock()
            .unwrap()
            .push((stage.to_string(), done, total));
    }
}

// ============================================================================
// FakeInstaller
// ============================================================================

#[derive(Debug)]
pub struct FakeInstaller {
    exit_code: i32,
    installed: Mutex<Vec<Vec<String>>>,
}

impl FakeInstaller {
    pub fn ok() -> Self {
        Self::exit(0)
    }

    pub fn exit(exit_code: i32) -> Self {
        Self {
            exit_code,
            installed: Mutex::new(Vec::new()),
        }
    }

    pub fn installed(&self) -> Vec<Vec<String>> {
        self.installed.lock().unwrap().clone()
    }
}

impl DependencyInstaller for FakeInstaller {
    fn install(&self, _root: &Path, packages: &[String], ui: &dyn Interaction) -> OrchidResult<i32> {
        self.installed.lock().unwrap().push(packages.to_vec());
        ui.install_output(&format!("added {} packages", packages.len()));
        Ok(self.exit_code)
    }
}
