//! CLI entry point for the AgriESG Rater tool.
//!
//! Provides subcommands for validating uploaded farm datasets, scoring them
//! end-to-end into a result table, and printing CSV templates per
//! granularity profile.

use std::path::{Path, PathBuf};

use agri_esg_rater::dataset::Table;
use agri_esg_rater::emissions::EmissionFactors;
use agri_esg_rater::output::{build_summary, write_summary, write_table_csv};
use agri_esg_rater::pipeline::{PipelineOptions, process_dataset};
use agri_esg_rater::schema::{self, Profile};
use agri_esg_rater::scoring::engine::{ScoringConfig, Strategy};
use agri_esg_rater::scoring::utility::mean;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "agri_esg_rater")]
#[command(about = "A tool to derive ESG scores from farm operational data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// Infer the granularity from the dataset headers
    Auto,
    Farm,
    EnterpriseCrop,
    Sme,
    FieldMonth,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Threshold,
    Percentile,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Strategy {
        match arg {
            StrategyArg::Threshold => Strategy::Threshold,
            StrategyArg::Percentile => Strategy::Percentile,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check a dataset for required columns without scoring it
    Validate {
        /// Path to the dataset CSV
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Data granularity profile
        #[arg(short, long, default_value = "auto")]
        profile: ProfileArg,
    },
    /// Run the full pipeline and write the scored result table
    Score {
        /// Path to the dataset CSV
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// CSV file to write the result table to
        #[arg(short, long, default_value = "scored.csv")]
        output: PathBuf,

        /// Data granularity profile
        #[arg(short, long, default_value = "auto")]
        profile: ProfileArg,

        /// Scoring strategy
        #[arg(short, long, default_value = "threshold")]
        strategy: StrategyArg,

        /// JSON file overriding the default emission factors
        #[arg(long)]
        factors: Option<PathBuf>,

        /// JSON file overriding the default scoring configuration
        #[arg(long)]
        scoring_config: Option<PathBuf>,

        /// Optional: also write a JSON score summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Print a CSV template for a granularity profile
    Template {
        /// Data granularity profile
        #[arg(short, long, default_value = "farm")]
        profile: ProfileArg,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/agri_esg_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("agri_esg_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { input, profile } => {
            let mut table = load_dataset(&input)?;
            let profile = resolve_profile(profile, &mut table);
            validate_dataset(&table, profile)?;
        }
        Commands::Score {
            input,
            output,
            profile,
            strategy,
            factors,
            scoring_config,
            summary,
        } => {
            let mut table = load_dataset(&input)?;
            let profile = resolve_profile(profile, &mut table);

            let options = PipelineOptions {
                factors: load_json_config::<EmissionFactors>(factors.as_deref())?,
                scoring: load_json_config::<ScoringConfig>(scoring_config.as_deref())?,
                strategy: strategy.into(),
            };

            let result = process_dataset(table, profile, &options)?;

            let scores = build_summary(&result);
            for entry in &scores.records {
                info!(
                    id = entry.id.as_deref().unwrap_or("?"),
                    year = entry.year,
                    esg_score = entry.esg_score,
                    rating = entry.rating.as_deref(),
                    "Record scored"
                );
            }
            let portfolio: Vec<f64> = scores.records.iter().filter_map(|e| e.esg_score).collect();
            info!(
                records = result.len(),
                portfolio_mean = if portfolio.is_empty() {
                    None
                } else {
                    Some(mean(&portfolio))
                },
                "Scoring complete"
            );

            write_table_csv(&output, &result)?;
            if let Some(summary_path) = summary {
                write_summary(&summary_path, &scores)?;
            }
        }
        Commands::Template { profile } => {
            let profile = match profile {
                ProfileArg::Auto | ProfileArg::Farm => Profile::Farm,
                ProfileArg::EnterpriseCrop => Profile::EnterpriseCrop,
                ProfileArg::Sme => Profile::Sme,
                ProfileArg::FieldMonth => Profile::FieldMonth,
            };
            print_template(profile);
        }
    }

    Ok(())
}

/// Reads the dataset bytes and parses them into the working table.
#[tracing::instrument(fields(input = %input.display()))]
fn load_dataset(input: &Path) -> Result<Table> {
    let table = Table::from_csv_path(input)
        .with_context(|| format!("failed to load dataset {}", input.display()))?;
    info!(rows = table.len(), columns = table.columns().len(), "Dataset loaded");
    Ok(table)
}

/// Resolves the profile argument, remapping human-readable headers first so
/// inference sees internal column names.
fn resolve_profile(arg: ProfileArg, table: &mut Table) -> Profile {
    for profile in [
        Profile::FieldMonth,
        Profile::EnterpriseCrop,
        Profile::Farm,
        Profile::Sme,
    ] {
        schema::remap_headers(table, profile);
    }

    let profile = match arg {
        ProfileArg::Auto => Profile::infer(table),
        ProfileArg::Farm => Profile::Farm,
        ProfileArg::EnterpriseCrop => Profile::EnterpriseCrop,
        ProfileArg::Sme => Profile::Sme,
        ProfileArg::FieldMonth => Profile::FieldMonth,
    };
    info!(profile = %profile, "Profile resolved");
    profile
}

/// Reports every missing required column at once, then the optional columns
/// that would unlock richer scoring.
fn validate_dataset(table: &Table, profile: Profile) -> Result<()> {
    let missing = schema::missing_columns(table, profile.required_columns());
    if !missing.is_empty() {
        for spec in &missing {
            error!(column = spec.name, label = spec.label, "Required column missing");
        }
        bail!("{} required column(s) missing", missing.len());
    }

    let absent_optional: Vec<&str> = profile
        .optional_columns()
        .iter()
        .filter(|spec| !table.has_column(spec.name))
        .map(|spec| spec.name)
        .collect();
    info!(
        rows = table.len(),
        optional_absent = absent_optional.join(", "),
        "Dataset is valid"
    );
    Ok(())
}

/// Loads a JSON configuration override, or the documented defaults.
fn load_json_config<T: serde::de::DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(T::default()),
    }
}

/// Prints a starter CSV (required columns only) for the profile to stdout.
fn print_template(profile: Profile) {
    let header: Vec<&str> = profile
        .required_columns()
        .iter()
        .map(|spec| spec.name)
        .collect();
    println!("{}", header.join(","));
    for row in template_rows(profile) {
        println!("{}", row.join(","));
    }
}

fn template_rows(profile: Profile) -> Vec<Vec<&'static str>> {
    match profile {
        Profile::Farm => vec![vec![
            "Green Valley Ltd",
            "FARM-001",
            "UK",
            "2025",
            "Spring Barley",
            "120",
            "540",
            "5400",
            "3100",
            "12000",
            "8000",
            "14",
            "6",
            "1",
        ]],
        Profile::EnterpriseCrop => vec![vec![
            "Green Valley Ltd",
            "FARM-001",
            "Arable",
            "UK",
            "2025",
            "Spring Barley",
            "120",
            "540",
            "5400",
            "3100",
            "12000",
            "8000",
            "14",
            "6",
            "1",
        ]],
        Profile::Sme => vec![vec![
            "Riverside Growers",
            "2025",
            "45",
            "180",
            "1900",
            "1050",
            "4200",
            "6",
            "2",
            "0",
        ]],
        Profile::FieldMonth => vec![
            vec![
                "FARM-001",
                "Green Valley Farm",
                "2025",
                "2025-03",
                "FIELD-001",
                "Spring Barley",
                "15",
                "25",
                "120",
                "yes",
                "no",
                "no",
                "yes",
                "yes",
                "no",
            ],
            vec![
                "FARM-001",
                "Green Valley Farm",
                "2025",
                "2025-04",
                "FIELD-001",
                "Spring Barley",
                "15",
                "20",
                "110",
                "no",
                "yes",
                "no",
                "yes",
                "yes",
                "no",
            ],
        ],
    }
}
