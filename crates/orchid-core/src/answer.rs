//! Answering questions about the codebase.

use orchid_model::ChatModel;

use crate::context::{format_snippets, load_user_files};
use crate::errors::{IntoOrchidResult, OrchidError};
use crate::indexer::Indexer;
use crate::interaction::{stage, Interaction};
use crate::prompts;

/// Inputs for one answer.
pub struct AnswerRequest<'a> {
    pub query: &'a str,
    pub user_files: &'a [String],
    /// Project hash whose collection is searched.
    pub hash: &'a str,
    pub search_limit: usize,
    pub model: &'a str,
}

/// Search, build the answer prompt and show the model's reply.
///
/// Model failures are reported through `ui` and give `None`.
pub fn answer_question(
    request: &AnswerRequest<'_>,
    indexer: &Indexer,
    chat: &dyn ChatModel,
    ui: &dyn Interaction,
) -> Option<String> {
    ui.progress(stage::SEARCHING, 0, 1);
    let chunks = indexer.search(request.hash, request.query, request.search_limit, ui);
    ui.progress(stage::SEARCHING, 1, 1);
    tracing::debug!("Answering with {} snippets", chunks.len());

    ui.think("Loading content from user-specified files...");
    let user_context = load_user_files(indexer.workspace(), request.user_files, ui);
    let prompt = prompts::answer_prompt(request.query, &user_context, &format_snippets(&chunks));

    ui.think("Orchid is thinking and generating an answer...");
    match chat.generate(request.model, &prompt).into_orchid_result() {
        Ok(text) => {
            let answer = text.trim().to_string();
            ui.show_answer(&answer);
            Some(answer)
        }
        Err(e @ OrchidError::ModelResponse { .. }) => {
            tracing::debug!("Bad answer response: {}", e);
            ui.error("Unexpected response format from Gemini API.");
            None
        }
        Err(e @ OrchidError::ModelRequest { .. }) => {
            ui.error(&e.to_string());
            None
        }
        Err(e) => {
            ui.error(&format!("Error during API request: {}", e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_config, FakeEmbedder, ScriptedChat, ScriptedInteraction};
    use crate::workspace::Workspace;
    use orchid_model::ModelError;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn indexer() -> (TempDir, Indexer) {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/schema.ts"), "export const songs = table();").unwrap();
        let ws = Workspace::from_root(tmp.path()).unwrap();
        let indexer = Indexer::new(ws, test_config(), Arc::new(FakeEmbedder::default()));
        (tmp, indexer)
    }

    #[test]
    fn test_answer_includes_snippets_and_files() {
        let (_tmp, indexer) = indexer();
        let ui = ScriptedInteraction::new();
        let report = indexer.initialize_project(&ui).unwrap();

        let chat = ScriptedChat::new(vec![Ok("  The songs table.  \n".into())]);
        let files = vec!["src/schema.ts".to_string()];
        let request = AnswerRequest {
            query: "what tables exist?",
            user_files: &files,
            hash: &report.hash,
            search_limit: 15,
            model: "gemini-2.5-pro",
        };

        let answer = answer_question(&request, &indexer, &chat, &ui).unwrap();
        assert_eq!(answer, "The songs table.");
        assert_eq!(ui.answers(), vec!["The songs table."]);

        let prompt = &chat.prompts()[0];
        assert!(prompt.contains("what tables exist?"));
        assert!(prompt.contains("--- START OF src/schema.ts ---"));
    }

    #[test]
    fn test_answer_reports_model_errors() {
        let (_tmp, indexer) = indexer();
        let ui = ScriptedInteraction::new();
        let chat = ScriptedChat::new(vec![Err(ModelError::unexpected_response("no candidates"))]);
        let request = AnswerRequest {
            query: "q",
            user_files: &[],
            hash: "none",
            search_limit: 5,
            model: "m",
        };
        assert!(answer_question(&request, &indexer, &chat, &ui).is_none());
        assert!(ui.saw("Unexpected response format from Gemini API."));

        let chat = ScriptedChat::new(vec![Err(ModelError::request("u", "reset"))]);
        assert!(answer_question(&request, &indexer, &chat, &ui).is_none());
        assert!(ui.saw("Error during API request"));
    }
}
