// checkcell CLI - inspect spreadsheet error questions headlessly
// Loads a question JSON, switches display status, renders worksheets, checks rankings.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use checkcell_cli::exit_codes::{
    graph_exit_code, model_exit_code, status_exit_code, EXIT_ERROR, EXIT_RANKING_INCOMPLETE,
    EXIT_SUCCESS, EXIT_USAGE,
};
use checkcell_cli::render::{self, RenderOptions};
use checkcell_config::settings::{InitialStatus, Settings};
use checkcell_engine::error::{GraphError, ModelError, StatusError};
use checkcell_engine::model::QuestionInfo;
use checkcell_engine::question::Question;
use checkcell_engine::ranking::RankingSubmission;
use checkcell_engine::status::StatusMode;

#[derive(Parser)]
#[command(name = "checkcell")]
#[command(about = "Inspect spreadsheet error questions and validate rankings (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log engine activity to stderr (same as RUST_LOG=debug)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every worksheet of a question under a display status
    #[command(after_help = "\
Cells marked * show their error value; outputs marked ~ show the value they
would have if only the isolated input were correct.

Examples:
  checkcell show question.json
  checkcell show question.json --status no-errors
  checkcell show question.json --isolate 'sheet1!A1'
  checkcell show question.json --sheet Summary --formulas
  checkcell show question.json --json | jq '.worksheets[].erroneous'")]
    Show {
        /// Question file (JSON)
        question: PathBuf,

        /// Display status: all-errors, no-errors, all-but-one-error
        #[arg(long)]
        status: Option<String>,

        /// Show every error except this input's (e.g. 'sheet1!A1')
        #[arg(long, value_name = "SHEET!CELL")]
        isolate: Option<String>,

        /// Only render this worksheet
        #[arg(long)]
        sheet: Option<String>,

        /// Show output formulas instead of values
        #[arg(long)]
        formulas: bool,

        /// Cell width in characters
        #[arg(long)]
        width: Option<usize>,

        /// Output JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// List rankable inputs with the outputs they affect
    Inputs {
        /// Question file (JSON)
        question: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a ranking covers every rankable input exactly once (exit 3 if not)
    #[command(after_help = "\
The ranking file holds two lists of cells:
  { \"ranked\": [{\"x\": 1, \"y\": 2, \"worksheet\": \"sheet1\"}], \"unimportant\": [] }

Examples:
  checkcell rank question.json ranking.json
  checkcell rank question.json ranking.json --json")]
    Rank {
        /// Question file (JSON)
        question: PathBuf,

        /// Ranking file (JSON)
        ranking: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the settings file location and effective settings
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        init: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  checkcell-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  checkcell-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let settings = Settings::load();

    let result = match cli.command {
        Commands::Show { question, status, isolate, sheet, formulas, width, json } => {
            cmd_show(&settings, question, status, isolate, sheet, formulas, width, json)
        }
        Commands::Inputs { question, json } => cmd_inputs(&settings, question, json),
        Commands::Rank { question, ranking, json } => cmd_rank(&settings, question, ranking, json),
        Commands::Config { init } => cmd_config(&settings, init),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn model(path: &Path, err: ModelError) -> Self {
        Self {
            code: model_exit_code(&err),
            message: format!("{}: {}", path.display(), err),
            hint: None,
        }
    }

    pub fn graph(err: GraphError) -> Self {
        let code = graph_exit_code(&err);
        let hint = match &err {
            GraphError::DanglingDependency { .. } | GraphError::DependentNotOutput { .. } => {
                Some("every dependent listed by an input must be declared under \"outputs\"".to_string())
            }
            GraphError::UnknownWorksheet(_) => Some("worksheet names are case-sensitive".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn status(err: StatusError) -> Self {
        let code = status_exit_code(&err);
        let hint = match &err {
            StatusError::NotRankable(_) | StatusError::MissingItem => {
                Some("run `checkcell inputs` to list the cells that can be isolated".to_string())
            }
            StatusError::UnknownStatus(_) => {
                Some("use all-errors, no-errors or all-but-one-error".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Loading
// ============================================================================

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| {
        CliError::args(format!("cannot read {}: {}", path.display(), e))
            .with_hint("check the path and permissions")
    })
}

fn load_question(path: &Path, settings: &Settings) -> Result<Question, CliError> {
    let json = read_file(path)?;
    let info = QuestionInfo::from_json(&json).map_err(|e| CliError::model(path, e))?;
    log::debug!(
        "loaded {}: {} inputs, {} outputs",
        path.display(),
        info.errors.len(),
        info.outputs.len()
    );
    Question::with_max_chained(&info, settings.max_chained_transitions).map_err(CliError::graph)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let output = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", output);
    Ok(())
}

fn print_text(text: &str) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// show
// ============================================================================

/// Status to show: `--status`, else `--isolate` alone, else the configured default.
fn resolve_mode(
    settings: &Settings,
    status: Option<&str>,
    isolate: Option<&str>,
) -> Result<StatusMode, CliError> {
    let mode = match (status, isolate) {
        (Some(s), _) => s.parse::<StatusMode>().map_err(CliError::status)?,
        (None, Some(_)) => StatusMode::AllButOneError,
        (None, None) => match settings.initial_status {
            InitialStatus::AllErrors => StatusMode::AllErrors,
            InitialStatus::NoErrors => StatusMode::NoErrors,
        },
    };

    match (mode, isolate) {
        (StatusMode::AllButOneError, None) => Err(CliError::args(
            "--status all-but-one-error requires --isolate",
        )
        .with_hint("pass the input to keep correct, e.g. --isolate 'sheet1!A1'")),
        (StatusMode::AllErrors | StatusMode::NoErrors, Some(_)) => Err(CliError::args(format!(
            "--isolate cannot be combined with --status {mode}"
        ))),
        _ => Ok(mode),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_show(
    settings: &Settings,
    path: PathBuf,
    status: Option<String>,
    isolate: Option<String>,
    sheet: Option<String>,
    formulas: bool,
    width: Option<usize>,
    json: bool,
) -> Result<(), CliError> {
    let mode = resolve_mode(settings, status.as_deref(), isolate.as_deref())?;
    let mut question = load_question(&path, settings)?;

    match isolate {
        Some(reference) => {
            let coord = render::parse_reference(&reference).map_err(CliError::args)?;
            question.isolate(&coord).map_err(CliError::status)?;
        }
        None => question.change_status(mode, None).map_err(CliError::status)?,
    }

    let opts = RenderOptions {
        sheet,
        show_formulas: formulas || settings.show_formulas,
        show_context_inputs: settings.show_context_inputs,
        column_width: width.unwrap_or(settings.column_width),
    };

    if json {
        let report = render::grid_report(&question, &opts).map_err(CliError::graph)?;
        print_json(&report)
    } else {
        let text = render::render_text(&question, &opts).map_err(CliError::graph)?;
        print_text(&text)
    }
}

// ============================================================================
// inputs
// ============================================================================

fn cmd_inputs(settings: &Settings, path: PathBuf, json: bool) -> Result<(), CliError> {
    let question = load_question(&path, settings)?;

    if json {
        print_json(&render::input_reports(&question))
    } else {
        print_text(&render::render_inputs(&question))
    }
}

// ============================================================================
// rank
// ============================================================================

fn cmd_rank(settings: &Settings, path: PathBuf, ranking: PathBuf, json: bool) -> Result<(), CliError> {
    let question = load_question(&path, settings)?;
    let submission = RankingSubmission::from_json(&read_file(&ranking)?)
        .map_err(|e| CliError::model(&ranking, e))?;

    match question.reconcile_ranking(&submission) {
        Ok(result) => {
            if json {
                print_json(&result)
            } else {
                let mut text = format!(
                    "ranking accepted: {} ranked, {} unimportant\n",
                    result.ranked.len(),
                    result.unimportant.len()
                );
                for (i, coord) in result.ranked.iter().enumerate() {
                    text.push_str(&format!("{:>4}. {}\n", i + 1, coord));
                }
                for coord in &result.unimportant {
                    text.push_str(&format!("   -  {}\n", coord));
                }
                print_text(&text)
            }
        }
        Err(err) => {
            if json {
                print_json(&err)?;
            }
            Err(CliError {
                code: EXIT_RANKING_INCOMPLETE,
                message: err.to_string(),
                hint: Some("every rankable input must appear exactly once across both lists".to_string()),
            })
        }
    }
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(settings: &Settings, init: bool) -> Result<(), CliError> {
    let path = Settings::config_path_display();
    if init {
        settings
            .save()
            .map_err(|e| CliError::io(format!("cannot write {}: {}", path, e)))?;
        eprintln!("wrote {}", path);
    } else {
        eprintln!("settings: {}", path);
    }
    print_json(settings)
}
