//! CLI definition and command dispatch for Orchid.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to the engine.
//!
//! ## Configuration Precedence
//!
//! 1. `--config <path>` / `ORCHID_CONFIG`
//! 2. `~/.orchid/config.yaml`
//! 3. Built-in defaults
//!
//! `GEMINI_API_KEY` comes from the shell, then the project's `.env`, then the
//! `.env` of the current directory.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::ui::{format, table, ColorMode, MessageType, ProgressMode, Style, TerminalUi};

use orchid_core::{
    GlobalConfig, Interaction, OrchidEngine, OrchidError, ReviewOutcome, RunOutcome, Workspace,
    CONFIG_PATH_ENV,
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

const TASK_PROMPT: &str = "Describe your task. Submit an empty line when done:";

/// Orchid – AI coding agent for Next.js projects
#[derive(Parser, Debug)]
#[command(name = "orchid")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (info logging)
    #[arg(short, long, global = true, env = "ORCHID_VERBOSE")]
    pub verbose: bool,

    /// Suppress progress and informational messages
    #[arg(short, long, global = true, env = "ORCHID_QUIET", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file (default: ~/.orchid/config.yaml)
    #[arg(long, global = true, env = "ORCHID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Color output mode
    #[arg(long, global = true, env = "ORCHID_COLOR", value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Project directory (default: current directory)
    #[arg(short = 'C', long = "project", global = true, env = "ORCHID_PROJECT")]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index the project's source files for code search
    #[command(after_help = r#"EXAMPLES:
    # Index the project in the current directory
    orchid init

    # Index another project
    orchid -C ../my-app init
"#)]
    Init,

    /// Ask a question or request a change
    #[command(after_help = r#"EXAMPLES:
    # Request a feature
    orchid run "Add a songs table and list songs on the home page"

    # Ask about the codebase
    orchid run "How is the database connection created?"

    # Attach files as extra context
    orchid run "Add a delete button" --file src/app/page.tsx

    # Type a multi-line task interactively
    orchid run
"#)]
    Run {
        /// The task or question. Read from stdin when omitted.
        task: Option<String>,

        /// Project-relative file to include as context (repeatable)
        #[arg(short, long = "file", value_name = "PATH")]
        files: Vec<String>,
    },

    /// Show index and environment status for the project
    #[command(after_help = r#"EXAMPLES:
    # Show current status
    orchid status

    # Get status as JSON for scripting
    orchid status --json | jq '.collectionPresent'
"#)]
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Inspect Orchid configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings
    Check {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration as YAML
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// Run function
// ============================================================================

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "orchid_core={lvl},orchid_cli={lvl},orchid_db={lvl},orchid_model={lvl}",
            lvl = level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn error_hint(err: &OrchidError) -> Option<String> {
    match err {
        OrchidError::InvalidConfiguration { hint, .. } => Some(hint.clone()),
        other => other.hint().map(str::to_string),
    }
}

/// Run the CLI application.
///
/// Returns `ExitCode::SUCCESS` on success (including a cancelled review or an
/// empty task), `ExitCode::FAILURE` on error.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let style = Style::new(cli.color);

    // Config commands report on the file itself, so they run before loading.
    if let Command::Config { action } = &cli.command {
        return finish(&style, handle_config(&style, cli.config.as_deref(), action));
    }

    let config = match GlobalConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let hint = match &cli.config {
                Some(path) => format!("Check your config at {}", path.display()),
                None => "Check your global config at ~/.orchid/config.yaml".to_string(),
            };
            eprintln!(
                "{}",
                style.error_with_context(
                    "Failed to initialize Orchid engine",
                    Some(&e.to_string()),
                    Some(&hint),
                )
            );
            return ExitCode::FAILURE;
        }
    };
    let engine = OrchidEngine::with_config(config);

    let resolved = match &cli.project {
        Some(root) => Workspace::from_root(root),
        None => Workspace::resolve(Path::new(".")),
    };
    let workspace = match resolved {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!(
                "{}",
                style.message(MessageType::Err, &format!("Failed to resolve project: {}", e))
            );
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Project root: {}", workspace.root().display());

    let result = match cli.command {
        Command::Init => {
            let ui = TerminalUi::new(style.clone(), ProgressMode::detect(cli.quiet, false), cli.quiet);
            handle_init(&style, &engine, workspace, &ui)
        }
        Command::Run { task, files } => {
            let ui = TerminalUi::new(style.clone(), ProgressMode::detect(cli.quiet, false), cli.quiet);
            handle_run(&style, &engine, workspace, task, files, &ui)
        }
        Command::Status { json } => handle_status(&style, &engine, &workspace, json),
        Command::Config { .. } => Ok(()),
    };

    finish(&style, result)
}

fn finish(style: &Style, result: Result<(), OrchidError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let hint = error_hint(&e);
            eprintln!("{}", style.error_with_context(&e.to_string(), None, hint.as_deref()));
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_init(
    style: &Style,
    engine: &OrchidEngine,
    workspace: Workspace,
    ui: &TerminalUi,
) -> Result<(), OrchidError> {
    let session = engine.open(workspace, false, ui)?;
    let report = session.init(ui)?;

    println!();
    println!(
        "{}",
        style.message(MessageType::Ok, "Project Initialized Successfully!")
    );
    println!(
        "{}",
        style.message_detail(
            "Scanned",
            &format!(
                "{} files, {} snippets",
                format::format_thousands(report.files as u64),
                format::format_thousands(report.chunks as u64)
            )
        )
    );
    println!(
        "{}",
        style.message_detail("Indexed", &format::format_thousands(report.indexed as u64))
    );
    if report.skipped_files > 0 {
        println!(
            "{}",
            style.message_detail("Unreadable", &report.skipped_files.to_string())
        );
    }
    if report.removed_collections > 0 {
        println!(
            "{}",
            style.message_detail(
                "Removed",
                &format!("{} outdated collection(s)", report.removed_collections)
            )
        );
    }
    println!(
        "{}",
        style.message_detail("Collection", &report.collection_path.display().to_string())
    );

    println!();
    println!("{}", style.message(MessageType::Hint, "Next steps:"));
    println!("  1. Ask a question:   orchid run \"How is the database set up?\"");
    println!("  2. Request a change: orchid run \"Add a songs table\"");
    Ok(())
}

/// Read lines until an empty line or EOF.
fn read_task<R: BufRead>(reader: R) -> std::io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n").trim().to_string())
}

fn handle_run(
    style: &Style,
    engine: &OrchidEngine,
    workspace: Workspace,
    task: Option<String>,
    files: Vec<String>,
    ui: &TerminalUi,
) -> Result<(), OrchidError> {
    println!("{}", style.banner());
    println!();

    let task = match task {
        Some(task) => task.trim().to_string(),
        None => {
            println!("{}", style.message(MessageType::Info, TASK_PROMPT));
            read_task(std::io::stdin().lock())?
        }
    };
    if task.is_empty() {
        ui.info("No task provided. Exiting.");
        return Ok(());
    }

    let session = engine.open(workspace, true, ui)?;

    match session.start(&task, &files, ui)? {
        RunOutcome::Reviewed {
            review: ReviewOutcome::PartiallyApplied { written, failed },
            ..
        } => {
            ui.info(&format!(
                "Kept {} approved change(s); {} failed.",
                written.len(),
                failed.len()
            ));
        }
        RunOutcome::Reviewed {
            review: ReviewOutcome::Applied { failed, .. },
            ..
        } if !failed.is_empty() => {
            for path in &failed {
                eprintln!("{}", style.list_item("-", path));
            }
        }
        outcome => tracing::debug!("Run finished: {:?}", outcome),
    }
    Ok(())
}

fn handle_status(
    style: &Style,
    engine: &OrchidEngine,
    workspace: &Workspace,
    json: bool,
) -> Result<(), OrchidError> {
    let status = engine.status(workspace);

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let yes_no = |b: bool| if b { "yes" } else { "no" };

    println!("{}", style.section("STATUS"));
    println!();
    println!("  {}", style.key_value("Project", &status.root.display().to_string()));
    println!("  {}", style.key_value("Sources", &status.src_dir.display().to_string()));
    println!(
        "  {}",
        style.key_value(
            "Database",
            &format!("{} (initialized: {})", status.db_dir.display(), yes_no(status.initialized))
        )
    );
    println!(
        "  {}",
        style.key_value(
            "API key",
            if status.api_key_set { "set" } else { "missing" }
        )
    );

    println!();
    println!("{}", style.section("INDEX"));
    println!();
    let mut fields = vec![
        ("Source files", format::format_thousands(status.files as u64)),
        ("Project hash", format::short_hash(&status.current_hash).to_string()),
        ("Up to date", yes_no(status.collection_present).to_string()),
    ];
    if let Some(count) = status.indexed_count {
        fields.push(("Snippets", format::format_thousands(count as u64)));
    }
    if let Some(backend) = &status.backend {
        fields.push(("Backend", backend.clone()));
    }
    if let Some(at) = status.indexed_at {
        fields.push(("Last indexed", format::format_relative_time(at)));
    }
    println!("{}", table::render_index_table(&fields));

    if !status.initialized {
        println!();
        println!("{}", style.message(MessageType::Hint, "Run `orchid init` to index this project."));
    } else if !status.collection_present {
        println!();
        println!("{}", style.message(MessageType::Warn, orchid_core::STALE_INDEX_WARNING));
    }
    Ok(())
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigCheck {
    path: Option<PathBuf>,
    exists: bool,
    warnings: Vec<String>,
    errors: Vec<String>,
}

/// The file `GlobalConfig::load` would read.
fn config_source(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| {
            std::env::var_os(CONFIG_PATH_ENV)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        })
        .or_else(GlobalConfig::default_path)
}

fn handle_config(
    style: &Style,
    explicit: Option<&Path>,
    action: &ConfigAction,
) -> Result<(), OrchidError> {
    match action {
        ConfigAction::Check { json } => handle_config_check(style, explicit, *json),
        ConfigAction::Show { json } => handle_config_show(style, explicit, *json),
    }
}

fn check_config(path: Option<&Path>) -> ConfigCheck {
    let mut check = ConfigCheck {
        path: path.map(Path::to_path_buf),
        exists: path.is_some_and(Path::is_file),
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    let parsed = match path.filter(|p| p.is_file()) {
        Some(p) => std::fs::read_to_string(p)
            .map_err(OrchidError::from)
            .and_then(|content| GlobalConfig::from_yaml(&content)),
        None => Ok(GlobalConfig::default()),
    };

    match parsed.and_then(|config| config.validate()) {
        Ok(warnings) => check.warnings = warnings,
        Err(e) => check.errors.push(match error_hint(&e) {
            Some(hint) => format!("{} ({})", e, hint),
            None => e.to_string(),
        }),
    }
    check
}

/// Validate the configuration file and report errors/warnings.
fn handle_config_check(
    style: &Style,
    explicit: Option<&Path>,
    json: bool,
) -> Result<(), OrchidError> {
    let source = config_source(explicit);
    let check = check_config(source.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&check)?);
    } else {
        match &check.path {
            Some(path) if check.exists => println!(
                "{}",
                style.message(MessageType::Info, &format!("Checked {}", path.display()))
            ),
            Some(path) => println!(
                "{}",
                style.message(
                    MessageType::Info,
                    &format!("{} not found; checking built-in defaults", path.display())
                )
            ),
            None => println!(
                "{}",
                style.message(MessageType::Info, "No home directory; checking built-in defaults")
            ),
        }
        println!();

        if !check.warnings.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Warn, &format!("{} warning(s):", check.warnings.len()))
            );
            for warning in &check.warnings {
                println!("  • {}", warning);
            }
            println!();
        }

        if !check.errors.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Err, &format!("{} error(s):", check.errors.len()))
            );
            for error in &check.errors {
                println!("  • {}", error);
            }
            println!();
        }

        if check.errors.is_empty() && check.warnings.is_empty() {
            println!("{}", style.message(MessageType::Ok, "Configuration is valid"));
        } else if check.errors.is_empty() {
            println!(
                "{}",
                style.message(MessageType::Ok, "Configuration is valid with warnings")
            );
        }
    }

    if !check.errors.is_empty() {
        return Err(OrchidError::InvalidConfiguration {
            message: format!("{} configuration error(s) found", check.errors.len()),
            hint: "Fix the values listed above".to_string(),
        });
    }
    Ok(())
}

/// Show the effective configuration.
fn handle_config_show(
    style: &Style,
    explicit: Option<&Path>,
    json: bool,
) -> Result<(), OrchidError> {
    let config = GlobalConfig::load(explicit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        if let Some(path) = config_source(explicit) {
            let note = if path.is_file() { "" } else { " (not found, defaults)" };
            println!(
                "{}",
                style.message(
                    MessageType::Info,
                    &format!("Effective configuration from {}{}:", path.display(), note)
                )
            );
            println!();
        }
        print!("{}", config.to_yaml()?);
    }
    Ok(())
}
