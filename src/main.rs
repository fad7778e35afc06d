//! Panic Predictor CLI
//!
//! Streaming heart-rate risk classification.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use panic_predictor::{
    analysis::{Activity, AggregateRiskAnalyzer, DatasetSource, RiskSummary, GENERAL_PRECAUTIONS},
    config::Config,
    core::StreamUpdate,
    session::{CancellationToken, RiskContext, StopReason, StreamingSession},
    source::SimulatedSource,
    transparency::{create_shared_log_with_persistence, SessionLog},
    DISCLAIMER, VERSION,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "panic-predictor")]
#[command(version = VERSION)]
#[command(about = "Streaming heart-rate panic-attack risk classification", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single heart-rate reading
    Predict {
        /// Heart rate in bpm (clamped to 40-160)
        #[arg(long)]
        hr: f64,
    },

    /// Monitor simulated readings until Ctrl+C
    Monitor {
        /// Seconds between readings (defaults to the configured interval)
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many readings
        #[arg(long)]
        count: Option<u64>,

        /// Write emitted updates to the export directory
        #[arg(long)]
        export: bool,
    },

    /// Show risk by hour and by activity
    Triggers,

    /// Show cumulative evaluation statistics
    Status {
        /// Clear the cumulative statistics
        #[arg(long)]
        reset: bool,
    },

    /// Display the disclaimer
    Disclaimer,

    /// Show configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Predict { hr } => cmd_predict(hr),
        Commands::Monitor {
            interval,
            count,
            export,
        } => cmd_monitor(interval, count, export),
        Commands::Triggers => cmd_triggers(),
        Commands::Status { reset } => cmd_status(reset),
        Commands::Disclaimer => {
            println!("{DISCLAIMER}");
            Ok(())
        }
        Commands::Config => cmd_config(),
    }
}

/// Log to stderr, filtered by `RUST_LOG` when set.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("panic_predictor={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().context("Failed to load configuration")?;
    if let Err(e) = config.ensure_directories() {
        tracing::warn!(error = %e, "Could not create data directories");
    }
    Ok(config)
}

fn analyzer_for(config: &Config) -> AggregateRiskAnalyzer {
    AggregateRiskAnalyzer::new(DatasetSource::File(config.dataset_path.clone()))
}

fn cmd_predict(hr: f64) -> anyhow::Result<()> {
    let config = load_config()?;
    let analyzer = analyzer_for(&config);
    let context = RiskContext::from_config(&config, &analyzer)?;

    let log = create_shared_log_with_persistence(config.stats_path());
    let mut session = StreamingSession::new(Arc::new(context)).with_log(log.clone());

    let decision = session.evaluate(hr).context("Evaluation failed")?;

    println!("Heart Rate:   {:.1} bpm", hr);
    println!("Status:       {}", decision.status_label());
    println!("Probability:  {:.2}%", decision.probability_pct());
    println!("Likely Cause: {}", decision.likely_cause());

    if let Err(e) = log.save() {
        tracing::warn!(error = %e, "Could not save session stats");
    }
    Ok(())
}

fn cmd_monitor(interval: Option<u64>, count: Option<u64>, export: bool) -> anyhow::Result<()> {
    println!("Panic Predictor v{VERSION}");
    println!("{DISCLAIMER}");

    let config = load_config()?;
    let analyzer = analyzer_for(&config);
    let mut context = RiskContext::from_config(&config, &analyzer)?;
    if let Some(secs) = interval {
        context = context.with_sample_interval(Duration::from_secs(secs));
    }

    println!(
        "Monitoring every {}s (threshold {:.0}%). Press Ctrl+C to stop.",
        context.sample_interval().as_secs(),
        context.threshold() * 100.0
    );
    println!();

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Error setting Ctrl+C handler")?;

    let log = create_shared_log_with_persistence(config.stats_path());
    let mut session = StreamingSession::new(Arc::new(context)).with_log(log.clone());
    let mut source = SimulatedSource::new();
    let mut updates: Vec<StreamUpdate> = Vec::new();

    let result = session.run(&mut source, &token, count, |update| {
        println!("{}", update.status_line());
        if export {
            updates.push(update.clone());
        }
    });

    if let Err(e) = log.save() {
        tracing::warn!(error = %e, "Could not save session stats");
    }

    if export && !updates.is_empty() {
        export_updates(&config.export_path, &updates)?;
    }

    let summary = result.context("Monitoring stopped on a pipeline error")?;
    println!();
    println!(
        "Stopped ({}): {} readings, {} flagged",
        match summary.stop_reason {
            StopReason::Cancelled => "cancelled",
            StopReason::IterationLimit => "count reached",
            StopReason::SourceExhausted => "source exhausted",
        },
        summary.iterations,
        summary.risk_flags
    );
    println!();
    println!("{}", log.summary());
    Ok(())
}

fn export_updates(dir: &std::path::Path, updates: &[StreamUpdate]) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create export directory {}", dir.display()))?;

    let path: PathBuf = dir.join(format!(
        "session_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));
    let json = serde_json::to_string_pretty(updates)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Could not write {}", path.display()))?;

    println!("Exported {} updates to {:?}", updates.len(), path);
    Ok(())
}

fn cmd_triggers() -> anyhow::Result<()> {
    let config = load_config()?;
    let tables = analyzer_for(&config).tables();
    print_summary(&tables.summary());
    Ok(())
}

fn print_summary(summary: &RiskSummary) {
    println!("Panic Attack Risk by Hour");
    println!("=========================");
    for (hour, pct) in summary.hourly.iter() {
        println!("  {hour:02}:00  {pct:5.1}%");
    }
    println!();

    println!("Panic Attack Risk by Activity");
    println!("=============================");
    for (activity, pct) in summary.activity.iter() {
        println!("  {:<20} {pct:5.1}%", activity.as_str());
    }
    println!();

    let hours: Vec<String> = summary
        .high_risk_hours
        .iter()
        .map(|h| format!("{h}:00"))
        .collect();
    println!(
        "High-Risk Times: {}",
        if hours.is_empty() {
            "None".to_string()
        } else {
            hours.join(", ")
        }
    );

    let activities: Vec<&str> = summary
        .high_risk_activities
        .iter()
        .map(|a| a.as_str())
        .collect();
    println!(
        "High-Risk Activities: {}",
        if activities.is_empty() {
            "None".to_string()
        } else {
            activities.join(", ")
        }
    );
    println!();

    println!("Precautions");
    println!("===========");
    println!("  General (high-risk times):");
    for precaution in GENERAL_PRECAUTIONS {
        println!("    - {precaution}");
    }
    println!("  Activity-specific:");
    for activity in Activity::ALL {
        if let Some(precaution) = activity.precaution() {
            println!("    - {}: {}", activity, precaution);
        }
    }
}

fn cmd_status(reset: bool) -> anyhow::Result<()> {
    let config = load_config()?;

    if reset {
        let log = SessionLog::with_persistence(config.stats_path());
        log.reset();
        log.save().context("Could not save session stats")?;
        println!("Statistics reset.");
        return Ok(());
    }

    println!("Panic Predictor Status");
    println!("======================");
    println!();

    println!("Configuration:");
    println!("  Sample interval: {}s", config.sample_interval.as_secs());
    println!("  Risk threshold: {:.0}%", config.risk_threshold * 100.0);
    println!("  Timezone: {}", config.timezone);
    println!(
        "  Dataset: {:?} ({})",
        config.dataset_path,
        if config.dataset_path.exists() {
            "present"
        } else {
            "will be generated"
        }
    );
    println!(
        "  Model: {}",
        config
            .model_path
            .as_ref()
            .map(|p| format!("{p:?}"))
            .unwrap_or_else(|| "built-in reference".to_string())
    );
    println!();

    let stats_path = config.stats_path();
    if stats_path.exists() {
        let log = SessionLog::with_persistence(stats_path);
        let stats = log.stats();
        println!("Cumulative Statistics:");
        println!("  Readings processed: {}", stats.readings_processed);
        println!("  Manual evaluations: {}", stats.manual_evaluations);
        println!("  Risk flags raised: {}", stats.risk_flags);
        println!("  Failed evaluations: {}", stats.failed_evaluations);
    } else {
        println!("No statistics recorded yet.");
    }
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    println!("Configuration file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
