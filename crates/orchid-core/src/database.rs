//! Database setup before planning.
//!
//! Reads `package.json` to see whether Drizzle and a driver are installed,
//! asks the user to pick a database when nothing is known, and collects the
//! connection string into `.env` for hosted databases.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Deserialize;

use crate::constants::{DATABASE_URL_ENV, ENV_BLOCK_HEADER};
use crate::errors::{OrchidError, OrchidResult};
use crate::intent::DatabaseKind;
use crate::interaction::Interaction;
use crate::workspace::Workspace;

/// Choices offered when the database is unknown. The first word is the kind.
pub const DATABASE_CHOICES: &[&str] = &["SQLite (local, no setup)", "MongoDB", "Supabase (Postgres)"];

// ============================================================================
// ProjectDependencies
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectDependencies {
    #[serde(default)]
    pub dependencies: BTreeMap<String, serde_json::Value>,
}

impl ProjectDependencies {
    /// Parse `package.json` at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// [`OrchidError::InvalidPackageJson`] when the file is not valid JSON.
    pub fn load(path: &Path) -> OrchidResult<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| OrchidError::InvalidPackageJson {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    pub fn has(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Drizzle plus a Postgres or SQLite driver.
    pub fn is_configured(&self) -> bool {
        self.has("drizzle-orm") && (self.has("pg") || self.has("better-sqlite3"))
    }

    /// Database implied by the installed driver.
    pub fn infer_database(&self) -> DatabaseKind {
        if self.has("pg") {
            DatabaseKind::Supabase
        } else if self.has("better-sqlite3") {
            DatabaseKind::Sqlite
        } else {
            DatabaseKind::Unknown
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Combine the classifier's answer with what the project already has.
///
/// May prompt the user for a database and a connection string.
pub fn resolve_database(
    classified: DatabaseKind,
    deps: Option<&ProjectDependencies>,
    workspace: &Workspace,
    ui: &dyn Interaction,
) -> OrchidResult<DatabaseKind> {
    let mut kind = classified;
    if kind == DatabaseKind::Unsupported {
        ui.error("Sorry, the database you mentioned is not supported.");
        kind = DatabaseKind::Unknown;
    }

    let configured = deps.is_some_and(ProjectDependencies::is_configured);

    if configured {
        ui.act("Project analysis complete. It seems Drizzle and a database are already configured.");
        if kind == DatabaseKind::Unknown {
            if let Some(deps) = deps {
                kind = deps.infer_database();
            }
        }
        return Ok(kind);
    }

    if kind == DatabaseKind::Unknown {
        ui.act("I see your project isn't fully configured. Let's set one up!");
        let choice = ui.select("Which database would you like to use?", DATABASE_CHOICES)?;
        kind = DATABASE_CHOICES
            .get(choice)
            .and_then(|c| c.split(' ').next())
            .and_then(DatabaseKind::from_label)
            .unwrap_or(DatabaseKind::Unknown);
    } else {
        ui.act(&format!("Okay, I'll set up your project to use {}.", kind));
    }

    if kind.needs_connection_string() {
        setup_env_file(kind, workspace, ui)?;
    }
    Ok(kind)
}

/// Prompt for the connection string of `kind` and append it to `.env`.
///
/// Returns whether the file was written.
pub fn setup_env_file(
    kind: DatabaseKind,
    workspace: &Workspace,
    ui: &dyn Interaction,
) -> OrchidResult<bool> {
    let question = match kind {
        DatabaseKind::MongoDb => {
            "Please enter your MongoDB connection string (e.g., mongodb+srv://...)"
        }
        DatabaseKind::Supabase => "Please enter your Supabase connection string (postgres://...)",
        _ => return Ok(false),
    };

    ui.think(&format!(
        "I need to help the user configure their .env file for {}.",
        kind
    ));
    let value = ui.input(question)?;
    let values = vec![(DATABASE_URL_ENV.to_string(), value.trim().to_string())];

    ui.act("I will now add the following to your `.env` file. Please confirm.");
    ui.show_env(&values);
    if !ui.confirm("Write these values to .env?", true)? {
        return Ok(false);
    }

    match append_env_values(&workspace.env_file(), &values) {
        Ok(()) => {
            ui.success(".env file updated successfully.");
            Ok(true)
        }
        Err(e) => {
            ui.error(&format!("Error writing to .env file: {}", e));
            Ok(false)
        }
    }
}

fn append_env_values(path: &Path, values: &[(String, String)]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(file, "\n\n{}\n", ENV_BLOCK_HEADER)?;
    for (key, value) in values {
        writeln!(file, "{}={}", key, value)?;
    }
    Ok(())
}
