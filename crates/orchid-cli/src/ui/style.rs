//! Message styling for CLI output.
//!
//! Provides consistent prefixes, colors, and formatting for all CLI messages.
//!
//! ## Message Types
//!
//! | Prefix | Meaning | Color |
//! |--------|---------|-------|
//! | `[ok]` | Success | Green |
//! | `[err]` | Error | Red |
//! | `[warn]` | Warning | Yellow |
//! | `[info]` | Information | Blue |
//! | `[think]` | Agent reasoning | Magenta |
//! | `[act]` | Agent action | Cyan |
//! | `[hint]` | Suggestion | Cyan |

use owo_colors::OwoColorize;

use super::color::ColorMode;

/// Message severity/type for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Success - operation completed successfully
    Ok,
    /// Error - operation failed, cannot continue
    Err,
    /// Warning - operation succeeded with caveats
    Warn,
    /// Information - neutral status or progress update
    Info,
    /// The agent is classifying, searching or planning
    Think,
    /// The agent is about to change the project
    Act,
    /// Hint - actionable next step or tip
    Hint,
}

impl MessageType {
    /// Returns the prefix text for this message type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Err => "[err]",
            Self::Warn => "[warn]",
            Self::Info => "[info]",
            Self::Think => "[think]",
            Self::Act => "[act]",
            Self::Hint => "[hint]",
        }
    }
}

/// Main styling interface for CLI output.
///
/// ```ignore
/// let style = Style::new(ColorMode::Never);
/// println!("{}", style.message(MessageType::Ok, "Operation completed"));
/// ```
#[derive(Debug, Clone)]
pub struct Style {
    color_mode: ColorMode,
}

impl Default for Style {
    fn default() -> Self {
        Self::new(ColorMode::Auto)
    }
}

impl Style {
    pub fn new(color_mode: ColorMode) -> Self {
        Self { color_mode }
    }

    pub fn colors_enabled(&self) -> bool {
        self.color_mode.is_enabled()
    }

    /// `[prefix] text`, with the prefix colored by type.
    pub fn message(&self, msg_type: MessageType, text: &str) -> String {
        let prefix = msg_type.prefix();
        if self.colors_enabled() {
            let colored_prefix = match msg_type {
                MessageType::Ok => prefix.green().to_string(),
                MessageType::Err => prefix.red().to_string(),
                MessageType::Warn => prefix.yellow().to_string(),
                MessageType::Info => prefix.blue().to_string(),
                MessageType::Think => prefix.magenta().to_string(),
                MessageType::Act | MessageType::Hint => prefix.cyan().to_string(),
            };
            format!("{} {}", colored_prefix, text)
        } else {
            format!("{} {}", prefix, text)
        }
    }

    /// Detail line with 5-space indentation, under a message.
    pub fn message_detail(&self, label: &str, value: &str) -> String {
        format!("     {}: {}", label, value)
    }

    pub fn section(&self, title: &str) -> String {
        if self.colors_enabled() {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Error with optional cause and hint lines.
    pub fn error_with_context(&self, msg: &str, cause: Option<&str>, hint: Option<&str>) -> String {
        let mut output = self.message(MessageType::Err, msg);

        if let Some(cause_text) = cause {
            output.push('\n');
            output.push_str(&format!("      Cause: {}", cause_text));
        }

        if let Some(hint_text) = hint {
            output.push('\n');
            output.push_str(&format!("      Hint: {}", hint_text));
        }

        output
    }

    /// `  + text`; `+` is green.
    pub fn list_item(&self, prefix: &str, text: &str) -> String {
        let styled_prefix = if self.colors_enabled() {
            match prefix {
                "+" => prefix.green().to_string(),
                "-" => prefix.red().to_string(),
                _ => prefix.to_string(),
            }
        } else {
            prefix.to_string()
        };
        format!("  {} {}", styled_prefix, text)
    }

    pub fn key_value(&self, key: &str, value: &str) -> String {
        if self.colors_enabled() {
            format!("{}: {}", key.dimmed(), value)
        } else {
            format!("{}: {}", key, value)
        }
    }

    pub fn file_path(&self, path: &str) -> String {
        if self.colors_enabled() {
            path.cyan().to_string()
        } else {
            path.to_string()
        }
    }

    pub fn dimmed(&self, text: &str) -> String {
        if self.colors_enabled() {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    /// Welcome banner for interactive runs.
    pub fn banner(&self) -> String {
        let title = "Orchid AI Agent";
        let tagline = "Your AI coding partner for Next.js and Drizzle";
        if self.colors_enabled() {
            format!("{}\n{}", title.magenta().bold(), tagline.dimmed())
        } else {
            format!("{}\n{}", title, tagline)
        }
    }

    /// Code with right-aligned line numbers.
    ///
    /// ```text
    ///  1 | export const songs = sqliteTable("songs", {
    ///  2 |   id: integer("id").primaryKey(),
    /// ```
    pub fn code_block(&self, code: &str) -> String {
        let total = code.lines().count().max(1);
        let width = total.to_string().len();
        code.lines()
            .enumerate()
            .map(|(i, line)| {
                let number = format!("{:>width$} |", i + 1, width = width);
                format!("{} {}", self.dimmed(&number), line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `body` inside a box with `title` on the top border.
    ///
    /// Lines longer than the box are wrapped on character boundaries.
    pub fn titled_box(&self, title: &str, body: &str, width: usize) -> String {
        let inner = width.saturating_sub(4).max(20);
        let label = format!(" {} ", title);
        let fill = (inner + 2).saturating_sub(label.chars().count());

        let mut out = String::new();
        let top_label = if self.colors_enabled() {
            label.bold().to_string()
        } else {
            label
        };
        out.push_str(&format!("┌{}{}┐\n", top_label, "─".repeat(fill)));

        for line in body.lines() {
            let chars: Vec<char> = line.chars().collect();
            if chars.is_empty() {
                out.push_str(&format!("│ {} │\n", " ".repeat(inner)));
                continue;
            }
            for piece in chars.chunks(inner) {
                let text: String = piece.iter().collect();
                out.push_str(&format!("│ {}{} │\n", text, " ".repeat(inner - piece.len())));
            }
        }

        out.push_str(&format!("└{}┘", "─".repeat(inner + 2)));
        out
    }
}
