// regrade - reconcile transferred grades against external competency checkpoints

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use regrade_config::Settings;
use regrade_io::IoError;
use regrade_recon::ReconError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use exit_codes::{io_exit_code, recon_exit_code, EXIT_SUCCESS};
use recon::ReconCommands;

#[derive(Parser)]
#[command(name = "regrade")]
#[command(about = "Reconcile exam and prerequisite grades against external competency checkpoints")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: ReconCommands,

    /// Settings file (default: <config dir>/regrade/settings.json)
    #[arg(long, global = true, env = "REGRADE_SETTINGS")]
    settings: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress the stderr summary and warnings
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = recon::cmd_recon(cli.command, &settings, cli.quiet);

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

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Engine error with its exit code and a hint where one helps.
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("run `regrade columns` to see the expected headers, or map them in a profile".to_string())
            }
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("run `regrade validate <profile>` to check it".to_string())
            }
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn io(err: IoError) -> Self {
        let hint = match &err {
            IoError::UnsupportedFormat(_) => {
                Some("save the sheet as .xlsx or .csv".to_string())
            }
            IoError::NoHeader => Some("the first row must hold the column headers".to_string()),
            IoError::TooManyRows { .. } => Some("write the result as .csv instead".to_string()),
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
