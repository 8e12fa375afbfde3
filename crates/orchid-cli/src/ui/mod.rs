//! # CLI UI Module
//!
//! Styling, tables, progress and prompts for the `orchid` binary.
//!
//! - `color`: Color mode detection and terminal capability checks
//! - `style`: Message types, prefixes, code blocks and boxes
//! - `format`: Utility formatters (time, counts, truncation)
//! - `table`: Plan and index tables with comfy-table
//! - `progress`: Spinners and bars for indexing and search
//! - `terminal`: The [`orchid_core::Interaction`] implementation

pub mod color;
pub mod format;
pub mod progress;
pub mod style;
pub mod table;
pub mod terminal;

pub use color::ColorMode;
pub use progress::{Progress, ProgressMode};
pub use style::{MessageType, Style};
pub use terminal::TerminalUi;
