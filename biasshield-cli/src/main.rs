//! BiasShield CLI: terminal front end for the loan-approval fairness dashboard.
//!
//! Every subcommand works without the prediction backend; results computed
//! locally are marked as such.

mod commands;
mod render;

use biasshield_core::remediation::RemediationStrategy;
use biasshield_core::trend::{MetricField, TimeRange};
use biasshield_core::{BiasShieldError, ProtectedAttribute};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// BiasShield: fairness analytics for loan approval models
#[derive(Parser, Debug)]
#[command(name = "biasshield", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Backend base URL (overrides configuration)
    #[arg(long)]
    backend_url: Option<String>,

    /// Skip the backend and use local results only
    #[arg(long)]
    offline: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Score a loan application
    Predict {
        /// JSON file with the application; flags below override its fields
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        race: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        income: Option<f64>,
        #[arg(long)]
        credit_score: Option<u32>,
        #[arg(long)]
        loan_amount: Option<f64>,
        /// Also print the decision letter
        #[arg(long)]
        explain: bool,
        /// Save the decision letter as PDF (backend only)
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Show per-attribute fairness metrics and disparities
    Fairness,
    /// Show metrics for every combination of two attributes
    Intersectional {
        #[arg(value_parser = parse_with::<ProtectedAttribute>)]
        primary: ProtectedAttribute,
        #[arg(value_parser = parse_with::<ProtectedAttribute>)]
        secondary: ProtectedAttribute,
        /// Only show combinations below the four-fifths threshold
        #[arg(long)]
        flagged: bool,
    },
    /// Show how disparity for an attribute has moved over time
    Trends {
        #[arg(value_parser = parse_with::<ProtectedAttribute>)]
        attribute: ProtectedAttribute,
        /// all, year, quarter or month (defaults to configuration)
        #[arg(short, long, value_parser = parse_with::<TimeRange>)]
        range: Option<TimeRange>,
        #[arg(short, long, default_value = "approval_disparity", value_parser = parse_with::<MetricField>)]
        metric: MetricField,
        /// Moving average window (defaults to configuration)
        #[arg(long)]
        window: Option<usize>,
    },
    /// Simulate a remediation strategy on an attribute's approval rates
    Remediate {
        #[arg(value_parser = parse_with::<ProtectedAttribute>)]
        attribute: ProtectedAttribute,
        #[arg(short, long, default_value = "threshold_optimization", value_parser = parse_with::<RemediationStrategy>)]
        strategy: RemediationStrategy,
        /// Between 0 and 1
        #[arg(long, default_value_t = 0.5)]
        strength: f64,
    },
    /// Generate a written report
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
    },
    /// Ask the backend to rerun its fairness analysis
    Analyze,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReportKind {
    /// Bias analysis
    Bias,
    /// Remediation strategy
    Remediation,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create default configuration file
    Init,
    /// Show current configuration
    Show,
}

fn parse_with<T>(s: &str) -> Result<T, String>
where
    T: FromStr<Err = BiasShieldError>,
{
    s.parse().map_err(|e: BiasShieldError| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "biasshield", "biasshield")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "biasshield.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    tracing::debug!(workspace = %workspace.display(), "Resolved workspace");

    let options = commands::GlobalOptions {
        workspace,
        json: cli.json,
        quiet: cli.quiet,
        backend_url: cli.backend_url,
        offline: cli.offline,
    };
    commands::handle_command(cli.command, &options).await
}
