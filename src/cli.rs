//! The command line interface.
use crate::analysis::Analysis;
use crate::log;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// Compare electricity providers and estimate the return on a solar and battery system.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already has files in it
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to also write the per-day replay of the usage history
    #[arg(long)]
    pub debug_output: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run an analysis.
    Run {
        /// Path to the analysis directory.
        analysis_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example analyses.
    Example {
        /// The available subcommands for managing example analyses.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Check an analysis's input files without running it.
    Validate {
        /// The path to the analysis directory.
        analysis_dir: PathBuf,
    },
    /// Manage the program settings file.
    Settings {
        /// The available subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { analysis_dir, opts } => handle_run_command(&analysis_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { analysis_dir } => handle_validate_command(&analysis_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ solar-roi --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Handle the `run` command.
pub fn handle_run_command(
    analysis_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = load_settings(settings)?;

    // Command-line flags take precedence over the settings file
    settings.debug_output |= opts.debug_output;
    settings.overwrite |= opts.overwrite;

    let default_output_path;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        default_output_path = get_output_dir(analysis_path)?;
        &default_output_path
    };

    let overwrite =
        create_output_directory(output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(Some(settings.log_level.as_str()), Some(output_path))
        .context("Failed to initialise logging.")?;

    let analysis = Analysis::from_path(analysis_path).context("Failed to load analysis.")?;
    info!("Loaded analysis from {}", analysis_path.display());
    info!("Output folder: {}", output_path.display());

    // Can only be logged once the logger exists
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    crate::simulation::run(&analysis, analysis_path, output_path, settings.debug_output)?;
    info!("Analysis complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(analysis_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // No log files: there is no output folder
    log::init(Some(settings.log_level.as_str()), None).context("Failed to initialise logging.")?;

    Analysis::from_path(analysis_path).context("Failed to validate analysis.")?;
    info!("Analysis validation successful!");

    Ok(())
}
