//! CLI entry point for the funnel rater tool.
//!
//! Provides subcommands for running the full analysis over a consultation
//! CSV export, printing a short summary report, and exporting windowed
//! rate tables.

use anyhow::Result;
use clap::{Parser, Subcommand};
use funnel_rater::analyzers::analyzer::analyze_file;
use funnel_rater::config::AnalysisConfig;
use funnel_rater::output::{summary_report, write_json, write_window_csv};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "funnel_rater")]
#[command(about = "A tool to analyze sales-consultation conversion funnels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional JSON config file with analysis settings
    #[arg(long, global = true)]
    config: Option<String>,

    /// Cohort window lengths in days
    #[arg(short, long, global = true, value_delimiter = ',')]
    windows: Option<Vec<i64>>,

    /// Weekly-to-monthly scaling factor for projected conversions
    #[arg(short, long, global = true)]
    monthly_multiplier: Option<f64>,

    /// Number of peak hours to surface in the timing insight
    #[arg(short, long, global = true)]
    top_hours: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write the result bundle as JSON
    Analyze {
        /// Path to the consultation CSV export
        #[arg(value_name = "CSV")]
        source: String,

        /// JSON file to write results to
        #[arg(short, long, default_value = "analysis_results.json")]
        output: String,
    },
    /// Run the analysis and print the plain-text summary report
    Summary {
        /// Path to the consultation CSV export
        #[arg(value_name = "CSV")]
        source: String,
    },
    /// Export one windowed rate table as CSV
    ExportRates {
        /// Path to the consultation CSV export
        #[arg(value_name = "CSV")]
        source: String,

        /// Window length in days to export
        #[arg(long, default_value_t = 3)]
        window: i64,

        /// CSV file to write the rate table to
        #[arg(short, long, default_value = "conversion_rates.csv")]
        output: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/funnel_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("funnel_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    match &cli.command {
        Commands::Analyze { source, output } => {
            let bundle = analyze_file(source, &config)?;
            write_json(output, &bundle)?;

            info!(
                consultations = bundle.basic_metrics.total_consultations,
                conversions = bundle.basic_metrics.total_conversions,
                overall_rate = bundle.basic_metrics.overall_conversion_rate,
                output,
                "Analysis complete"
            );
        }
        Commands::Summary { source } => {
            let bundle = analyze_file(source, &config)?;
            println!("{}", summary_report(&bundle));
        }
        Commands::ExportRates {
            source,
            window,
            output,
        } => {
            let mut config = config;
            config.window_days = vec![*window];

            let bundle = analyze_file(source, &config)?;
            let report = bundle
                .windowed
                .first()
                .ok_or_else(|| anyhow::anyhow!("no windowed report produced"))?;
            write_window_csv(output, report)?;
        }
    }

    Ok(())
}

/// Builds the analysis config: file settings (when given) overridden by
/// explicit CLI flags.
fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(windows) = &cli.windows {
        config.window_days = windows.clone();
    }
    if let Some(multiplier) = cli.monthly_multiplier {
        config.monthly_multiplier = multiplier;
    }
    if let Some(top_hours) = cli.top_hours {
        config.top_hours = top_hours;
    }

    Ok(config)
}
