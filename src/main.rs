//! QA Review CLI - rate model answers against gold answers, one question at a time

mod commands;

use clap::{Parser, Subcommand};
use qareview::config::{self, QaReviewConfig, Settings};
use qareview::output::OutputMode;
use qareview::ui;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "qareview")]
#[command(version)]
#[command(about = "QA Review - rate model answers against gold answers")]
#[command(long_about = r#"
QA Review walks a question/answer dataset one record at a time and stores
a star rating and a remark for each model answer.

Example usage:
  qareview init
  qareview review --input "qa_dataset - Sheet1.csv"
  qareview save --row 3 --rating 4 --remark "Misses the rebate" --name Rahim --type officer
  qareview stats --json
  qareview export --dir exports
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./qareview.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source dataset CSV
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Annotation CSV written by the csv backend
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Annotation backend (csv or sqlite)
    #[arg(short, long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive review session
    Review,

    /// Save one rating/remark without the interactive prompt
    Save {
        /// Question number (1-based)
        #[arg(short, long)]
        row: usize,

        /// Rating: 1-5, a name such as "good", or the full label
        #[arg(long)]
        rating: Option<String>,

        /// Free-text remark
        #[arg(long)]
        remark: Option<String>,

        /// Reviewer name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Reviewer type (payer, non-payer, officer)
        #[arg(short = 't', long = "type")]
        reviewer_type: Option<String>,
    },

    /// Show one question with its saved review
    Show {
        /// Question number (1-based)
        #[arg(short, long)]
        row: usize,
    },

    /// Show review progress and rating statistics
    Stats {
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Write a timestamped copy of the annotation table
    Export {
        /// Directory for the export (defaults to export_dir from config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Load an annotation CSV into the SQLite store
    Import {
        /// Annotation CSV to import
        #[arg(short, long)]
        from: PathBuf,
    },

    /// Write a default qareview.toml
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the current version
    Version,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    match cli.command {
        Commands::Init { force } => return commands::run_init(&config_path, force),
        Commands::Version => return commands::run_version(OutputMode::Human),
        _ => {}
    }

    let settings = resolve_settings(&cli)?;

    match cli.command {
        Commands::Review => commands::run_review(&settings),
        Commands::Save {
            row,
            rating,
            remark,
            name,
            reviewer_type,
        } => commands::run_save(
            &settings,
            commands::SaveArgs {
                row,
                rating,
                remark,
                name,
                reviewer_type,
            },
        ),
        Commands::Show { row } => commands::run_show(&settings, row),
        Commands::Stats { json } => commands::run_stats(&settings, OutputMode::from_json_flag(json)),
        Commands::Export { dir } => commands::run_export(&settings, dir),
        Commands::Import { from } => commands::run_import(&settings, &from),
        Commands::Init { .. } | Commands::Version => Ok(()),
    }
}

/// Config file values with command-line overrides on top
fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut file_config: QaReviewConfig = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    if let Some(input) = &cli.input {
        file_config.input = Some(input.display().to_string());
    }
    if let Some(output) = &cli.output {
        file_config.output = Some(output.display().to_string());
    }
    if let Some(backend) = &cli.backend {
        file_config.backend = Some(backend.clone());
    }

    let settings = Settings::resolve(&file_config)?;
    tracing::debug!(
        "Input {}, backend {:?}, timezone {}",
        settings.input.display(),
        settings.backend,
        settings.clock.offset()
    );
    Ok(settings)
}
