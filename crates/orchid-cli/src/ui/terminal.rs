//! Terminal front end for the engine's [`Interaction`] seam.
//!
//! Messages go through [`Style`], prompts through `dialoguer`, and stage
//! progress through `indicatif` bars keyed by stage name.

use std::cell::RefCell;
use std::collections::HashMap;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use orchid_core::{Interaction, OrchidError, Plan, PlanStep};

use super::color::terminal_width;
use super::progress::{Progress, ProgressMode};
use super::style::{MessageType, Style};
use super::table::{render_plan_table, PlanRow};

fn prompt_error(e: dialoguer::Error) -> OrchidError {
    OrchidError::Prompt(e.to_string())
}

pub struct TerminalUi {
    style: Style,
    mode: ProgressMode,
    /// Hide think/act/info lines.
    quiet: bool,
    bars: RefCell<HashMap<String, Progress>>,
}

impl TerminalUi {
    pub fn new(style: Style, mode: ProgressMode, quiet: bool) -> Self {
        Self {
            style,
            mode,
            quiet,
            bars: RefCell::new(HashMap::new()),
        }
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Print to stdout above any active bar.
    fn out(&self, line: &str) {
        match self.bars.borrow().values().next() {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }

    fn chatter(&self, kind: MessageType, message: &str) {
        if !self.quiet {
            self.out(&self.style.message(kind, message));
        }
    }

    fn clear_bars(&self) {
        for (_, bar) in self.bars.borrow_mut().drain() {
            bar.finish_clear();
        }
    }
}

impl Interaction for TerminalUi {
    fn think(&self, message: &str) {
        self.chatter(MessageType::Think, message);
    }

    fn act(&self, message: &str) {
        self.chatter(MessageType::Act, message);
    }

    fn info(&self, message: &str) {
        self.chatter(MessageType::Info, message);
    }

    fn success(&self, message: &str) {
        self.out(&self.style.message(MessageType::Ok, message));
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", self.style.message(MessageType::Warn, message));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", self.style.message(MessageType::Err, message));
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, OrchidError> {
        self.clear_bars();
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }

    fn select(&self, message: &str, options: &[&str]) -> Result<usize, OrchidError> {
        self.clear_bars();
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .default(0)
            .items(options)
            .interact()
            .map_err(prompt_error)
    }

    fn input(&self, message: &str) -> Result<String, OrchidError> {
        self.clear_bars();
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .interact_text()
            .map_err(prompt_error)
    }

    fn show_plan(&self, plan: &Plan) {
        println!();
        println!("{}", self.style.section("PLAN"));
        if !plan.dependencies.is_empty() {
            println!();
            println!("{}", self.style.key_value("Dependencies", ""));
            for dep in &plan.dependencies {
                println!("{}", self.style.list_item("+", dep));
            }
        }
        let rows = PlanRow::from_plan(plan);
        if !rows.is_empty() {
            println!();
            println!("{}", render_plan_table(&rows));
        }
        println!();
    }

    fn show_step(&self, index: usize, total: usize, step: &PlanStep) {
        let action = step
            .action
            .as_ref()
            .map(|a| a.to_string())
            .unwrap_or_default();
        let path = step.path.as_deref().unwrap_or("");

        println!();
        println!(
            "{}",
            self.style.section(&format!(
                "Step {}/{}: {} {}",
                index,
                total,
                action,
                self.style.file_path(path)
            ))
        );
        if let Some(thought) = step.thought.as_deref().filter(|t| !t.trim().is_empty()) {
            println!("{}", self.style.message(MessageType::Think, thought.trim()));
        }
        if let Some(code) = step.code.as_deref() {
            println!();
            println!("{}", self.style.code_block(code));
        }
        println!();
    }

    fn show_answer(&self, answer: &str) {
        self.clear_bars();
        println!();
        println!(
            "{}",
            self.style
                .titled_box("Orchid's Answer", answer, terminal_width().min(100))
        );
    }

    fn show_env(&self, values: &[(String, String)]) {
        for (key, value) in values {
            println!("  {}", self.style.key_value(key, value));
        }
    }

    fn install_output(&self, line: &str) {
        println!("  {}", self.style.dimmed(line));
    }

    fn progress(&self, stage: &str, done: usize, total: usize) {
        let mut bars = self.bars.borrow_mut();
        let bar = bars.entry(stage.to_string()).or_insert_with(|| {
            if total <= 1 {
                Progress::spinner(stage, self.mode)
            } else {
                Progress::bar(total as u64, stage, self.mode)
            }
        });
        bar.set_position(done as u64);

        if done >= total {
            if let Some(bar) = bars.remove(stage) {
                tracing::debug!("{} finished in {:?}", stage, bar.elapsed());
                bar.finish_clear();
            }
        }
    }
}
