//! `regrade` subcommands: reconcile a grade sheet, check a profile, explain one record.

use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};
use regrade_config::{OutputFormat, Settings};
use regrade_io::ExportFormat;
use regrade_recon::model::{Decision, ReconciledRecord};
use regrade_recon::{Cell, Field, GradeRecord, ReconConfig, StageClassifier};

use crate::exit_codes::{EXIT_ERROR, EXIT_READ, EXIT_WRITE};
use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

fn settings_format(f: OutputFormat) -> ExportFormat {
    match f {
        OutputFormat::Xlsx => ExportFormat::Xlsx,
        OutputFormat::Csv => ExportFormat::Csv,
    }
}

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile a grade sheet and write the result file
    #[command(after_help = "\
Examples:
  regrade run group_101.xlsx
  regrade run group_101.xlsx --dynamics
  regrade run grades.csv --config spring.regrade.toml --format csv
  regrade run grades.csv --output result.xlsx --json")]
    Run {
        /// Grade sheet (.csv, .tsv, .xlsx, .xls, .xlsb, .ods)
        input: PathBuf,

        /// Reconciliation profile (.regrade.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Veto credit when the external checkpoints regress
        #[arg(long, overrides_with = "no_dynamics")]
        dynamics: bool,

        /// Skip the dynamics check even if the profile or settings turn it on
        #[arg(long, overrides_with = "dynamics")]
        no_dynamics: bool,

        /// Result file (default: Результат_<name>_<date>.<format> beside the input)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Result file format
        #[arg(long, short = 'f', value_enum)]
        format: Option<FormatArg>,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a reconciliation profile without running
    #[command(after_help = "\
Examples:
  regrade validate spring.regrade.toml")]
    Validate {
        /// Path to the .regrade.toml profile
        config: PathBuf,
    },

    /// Reconcile a single record given on the command line
    #[command(after_help = "\
Examples:
  regrade explain --subject 'Экзамен по программированию' --exam 7 --prerequisite 9 --interim 8
  regrade explain --subject 'Экзамен' --exam 6 --input 8 --interim 5 --final 5 --dynamics")]
    Explain {
        /// Subject name (picks the checkpoint stage)
        #[arg(long)]
        subject: String,

        #[arg(long)]
        exam: Option<f64>,

        #[arg(long)]
        prerequisite: Option<f64>,

        /// Input checkpoint grade
        #[arg(long)]
        input: Option<f64>,

        /// Interim checkpoint grade
        #[arg(long)]
        interim: Option<f64>,

        /// Final checkpoint grade
        #[arg(long = "final")]
        final_: Option<f64>,

        /// Veto credit when the external checkpoints regress
        #[arg(long, overrides_with = "no_dynamics")]
        dynamics: bool,

        /// Skip the dynamics check even if the profile or settings turn it on
        #[arg(long, overrides_with = "dynamics")]
        no_dynamics: bool,

        /// Reconciliation profile (stage tokens)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Print the decision as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// List the input columns a grade sheet must carry
    Columns {
        /// Reconciliation profile (column mapping)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

pub fn cmd_recon(cmd: ReconCommands, settings: &Settings, quiet: bool) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { input, config, dynamics, no_dynamics, output, format, json } => {
            let dynamics = dynamics_flag(dynamics, no_dynamics);
            cmd_run(input, config, dynamics, output, format, json, quiet, settings)
        }
        ReconCommands::Validate { config } => cmd_validate(config),
        ReconCommands::Explain {
            subject,
            exam,
            prerequisite,
            input,
            interim,
            final_,
            dynamics,
            no_dynamics,
            config,
            json,
        } => {
            let record = GradeRecord {
                row: 0,
                subject_name: subject,
                exam_grade: exam,
                prerequisite_grade: prerequisite,
                external_checkpoint_input: input,
                external_checkpoint_interim: interim,
                external_checkpoint_final: final_,
            };
            cmd_explain(record, dynamics_flag(dynamics, no_dynamics), config, json, settings)
        }
        ReconCommands::Columns { config } => cmd_columns(config, settings),
    }
}

/// Profile from `--config`, else the settings' profile, else built-in defaults.
fn load_profile(flag: Option<PathBuf>, settings: &Settings) -> Result<ReconConfig, CliError> {
    let Some(path) = flag.or_else(|| settings.profile.clone()) else {
        return Ok(ReconConfig::default());
    };

    let config_str = std::fs::read_to_string(&path).map_err(|e| CliError {
        code: EXIT_READ,
        message: format!("cannot read profile {}: {e}", path.display()),
        hint: None,
    })?;

    let config = ReconConfig::from_toml(&config_str).map_err(CliError::recon)?;
    tracing::debug!("loaded profile '{}' from {}", config.name, path.display());
    Ok(config)
}

/// `--dynamics` / `--no-dynamics`; at most one survives parsing, neither means unset.
fn dynamics_flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// First explicit choice wins: flag, then profile, then settings.
fn effective_dynamics(flag: Option<bool>, config: &ReconConfig, settings: &Settings) -> bool {
    flag.or(config.use_dynamics).unwrap_or(settings.use_dynamics)
}

fn resolve_format(flag: Option<FormatArg>, output: Option<&Path>, settings: &Settings) -> ExportFormat {
    if let Some(f) = flag {
        return f.into();
    }
    let ext = output
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext.parse::<ExportFormat>() {
        Ok(f) => f,
        Err(_) => settings_format(settings.output_format),
    }
}

fn resolve_output(
    input: &Path,
    output: Option<PathBuf>,
    format: ExportFormat,
    settings: &Settings,
) -> Result<PathBuf, CliError> {
    if let Some(path) = output {
        return Ok(path);
    }

    let today = chrono::Local::now().date_naive();
    let name = regrade_io::result_file_name(input, today, format, &settings.date_format)
        .map_err(|e| {
            CliError::io(e).with_hint("check \"output.dateFormat\" in settings.json")
        })?;

    let dir = match &settings.output_directory {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| CliError {
                code: EXIT_WRITE,
                message: format!("cannot create output directory {}: {e}", dir.display()),
                hint: None,
            })?;
            dir.clone()
        }
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(name))
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    input: PathBuf,
    config_path: Option<PathBuf>,
    dynamics: Option<bool>,
    output: Option<PathBuf>,
    format: Option<FormatArg>,
    json_output: bool,
    quiet: bool,
    settings: &Settings,
) -> Result<(), CliError> {
    let config = load_profile(config_path, settings)?;
    let use_dynamics = effective_dynamics(dynamics, &config, settings);
    let format = resolve_format(format, output.as_deref(), settings);

    let (table, import_report) = regrade_io::import(&input).map_err(CliError::io)?;
    tracing::info!(
        "read {} rows from {} ({} empty rows skipped)",
        import_report.rows_imported,
        input.display(),
        import_report.empty_rows_skipped,
    );

    let result = regrade_recon::run(&config, &table, use_dynamics).map_err(CliError::recon)?;
    let annotated = regrade_recon::annotate_table(&table, &result, &config).map_err(CliError::recon)?;

    let output_path = resolve_output(&input, output, format, settings)?;
    regrade_io::export(&annotated, &output_path, format).map_err(CliError::io)?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&result).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{json_str}");
    }

    if !quiet {
        let s = &result.summary;
        eprintln!(
            "{} records: {} prerequisite credits, {} exam credits, {} with no credit",
            s.total_records, s.prerequisite_credited, s.exam_credited, s.no_credit,
        );
        if use_dynamics {
            eprintln!("dynamics: {} vetoed", s.dynamics_vetoed);
        }
        if s.coerced_cells > 0 {
            eprintln!("note: {} unreadable grade cell(s) treated as absent", s.coerced_cells);
        }
        eprintln!("wrote {}", output_path.display());
    }

    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path).map_err(|e| CliError {
        code: EXIT_READ,
        message: format!("cannot read profile: {e}"),
        hint: None,
    })?;

    let config = ReconConfig::from_toml(&config_str).map_err(CliError::recon)?;
    eprintln!(
        "valid: profile '{}' with {} final token(s), {} interim token(s), dynamics {}",
        config.name,
        config.stages.final_tokens.len(),
        config.stages.interim_tokens.len(),
        match config.use_dynamics {
            Some(true) => "on",
            Some(false) => "off",
            None => "from settings",
        },
    );
    Ok(())
}

fn cmd_explain(
    record: GradeRecord,
    dynamics: Option<bool>,
    config_path: Option<PathBuf>,
    json_output: bool,
    settings: &Settings,
) -> Result<(), CliError> {
    let config = load_profile(config_path, settings)?;
    let use_dynamics = effective_dynamics(dynamics, &config, settings);
    let classifier = StageClassifier::new(&config.stages);

    let reconciled = regrade_recon::reconcile_record(&record, &classifier, use_dynamics);

    if json_output {
        let json_str = serde_json::to_string_pretty(&reconciled).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{json_str}");
        return Ok(());
    }

    print!("{}", render_explanation(&record, &reconciled, use_dynamics));
    Ok(())
}

fn grade(value: Option<f64>) -> String {
    match Cell::from(value) {
        Cell::Empty => "-".to_string(),
        cell => cell.to_string(),
    }
}

fn decision_line(label: &str, decision: &Decision) -> String {
    format!("{label:<14}{}  [{}]\n", grade(decision.credit), decision.rule)
}

fn render_explanation(record: &GradeRecord, reconciled: &ReconciledRecord, use_dynamics: bool) -> String {
    let inputs = &reconciled.inputs;
    let mut out = String::new();

    out.push_str(&format!(
        "{:<14}{} ({})\n",
        "stage:",
        reconciled.stage,
        reconciled.stage.number()
    ));
    out.push_str(&format!("{:<14}{}\n", "exam:", grade(Some(inputs.exam_grade))));

    let prerequisite = grade(Some(inputs.prerequisite_grade));
    match record.prerequisite_grade {
        Some(raw) if raw != inputs.prerequisite_grade => out.push_str(&format!(
            "{:<14}{} (clamped from {})\n",
            "prerequisite:",
            prerequisite,
            grade(Some(raw))
        )),
        _ => out.push_str(&format!("{:<14}{}\n", "prerequisite:", prerequisite)),
    }

    out.push_str(&format!(
        "{:<14}{} ({} checkpoint)\n",
        "external:",
        grade(Some(inputs.external_grade)),
        reconciled.stage
    ));
    if use_dynamics {
        out.push_str(&format!(
            "{:<14}{} -> {} -> {}{}\n",
            "dynamics:",
            grade(Some(inputs.checkpoint_input)),
            grade(Some(inputs.checkpoint_interim)),
            grade(Some(inputs.checkpoint_final)),
            if reconciled.vetoed() { "  (regression, vetoed)" } else { "" },
        ));
    }

    out.push_str(&decision_line("ДПР credit:", &reconciled.prerequisite_credit));
    out.push_str(&decision_line("НЭ credit:", &reconciled.exam_credit));
    out
}

fn cmd_columns(config_path: Option<PathBuf>, settings: &Settings) -> Result<(), CliError> {
    let config = load_profile(config_path, settings)?;

    for field in Field::ALL {
        println!("{:<20}{}", field.to_string(), config.columns.header(field));
    }
    eprintln!(
        "appended: {}, {}, {}",
        config.output.stage, config.output.prerequisite_credit, config.output.exam_credit
    );
    Ok(())
}
