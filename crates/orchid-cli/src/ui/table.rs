//! Table rendering for CLI output using comfy-table.
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `orchid run` (plan review) | `render_plan_table()` |
//! | `orchid status` | `render_index_table()` |

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use orchid_core::Plan;

use super::format::{first_line, truncate_str};

/// One plan step for display.
#[derive(Debug, Clone)]
pub struct PlanRow {
    /// 1-based step number
    pub index: usize,
    pub action: String,
    pub path: String,
    /// First line of the model's reasoning
    pub thought: String,
    /// Has an action, a path and code
    pub valid: bool,
}

impl PlanRow {
    pub fn from_plan(plan: &Plan) -> Vec<Self> {
        plan.steps()
            .iter()
            .enumerate()
            .map(|(i, step)| PlanRow {
                index: i + 1,
                action: step
                    .action
                    .as_ref()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                path: step.path.clone().unwrap_or_else(|| "(missing)".to_string()),
                thought: first_line(step.thought.as_deref().unwrap_or("")).to_string(),
                valid: step.is_valid(),
            })
            .collect()
    }
}

/// Render the plan overview shown before step-by-step review.
///
/// ```text
///  #  ACTION       PATH                          THOUGHT
///  1  CREATE_FILE  src/db/schema.ts              Define the songs table.
///  2  UPDATE_FILE  src/app/page.tsx              List songs on the home page.
/// ```
pub fn render_plan_table(rows: &[PlanRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![
        Cell::new("#").set_alignment(CellAlignment::Right),
        Cell::new("ACTION"),
        Cell::new("PATH"),
        Cell::new("THOUGHT"),
    ]);

    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(3)),  // #
        ColumnConstraint::LowerBoundary(Width::Fixed(11)), // ACTION
        ColumnConstraint::LowerBoundary(Width::Fixed(20)), // PATH
        ColumnConstraint::LowerBoundary(Width::Fixed(10)), // THOUGHT
    ]);

    for row in rows {
        let thought = if row.valid {
            truncate_str(&row.thought, 60)
        } else {
            "(invalid step, will be skipped)".to_string()
        };
        table.add_row(vec![
            Cell::new(row.index).set_alignment(CellAlignment::Right),
            Cell::new(&row.action),
            Cell::new(truncate_str(&row.path, 50)),
            Cell::new(thought),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render key/value pairs as a two-column table.
///
/// ```text
/// INDEX               VALUE
/// Snippets              412
/// Backend           lancedb
/// ```
pub fn render_index_table(fields: &[(&str, String)]) -> String {
    if fields.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![
        Cell::new("INDEX"),
        Cell::new("VALUE").set_alignment(CellAlignment::Right),
    ]);

    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(18)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
    ]);

    for (key, value) in fields {
        table.add_row(vec![
            Cell::new(*key),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }

    table.trim_fmt().to_string()
}
