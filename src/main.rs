use anyhow::{Context, Result};
use clap::Parser;
use genre_forecast::charts::{ChartSink, LogCharts, NoCharts};
use genre_forecast::config::PipelineConfig;
use genre_forecast::engine::format_accuracy_report;
use genre_forecast::pipeline::run_pipeline;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "genre-forecast")]
#[command(about = "Forecast yearly genre popularity from music catalog CSVs", long_about = None)]
struct CliArgs {
    /// Raw catalog CSV files. Overrides `inputs` from the config file.
    inputs: Vec<PathBuf>,

    /// Directory for the output tables.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated genres to forecast.
    #[arg(long, value_delimiter = ',')]
    genres: Option<Vec<String>>,

    /// Seed for prediction interval simulation.
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Emit chart summaries to the log.
    #[arg(long)]
    charts: bool,
}

fn resolve_config(args: &CliArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?,
        None => PipelineConfig::default(),
    };

    if !args.inputs.is_empty() {
        config.inputs = args.inputs.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(genres) = &args.genres {
        config.genres = genres.iter().map(|g| g.trim().to_lowercase()).collect();
    }
    if let Some(seed) = args.seed {
        config.trend.seed = seed;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(args.log_level.into())
                .parse_lossy(""),
        )
        .init();

    let config = resolve_config(&args)?;
    info!(inputs = ?config.inputs, output_dir = ?config.output_dir, "starting run");

    let mut log_charts = LogCharts;
    let mut no_charts = NoCharts;
    let charts: &mut dyn ChartSink = if args.charts {
        &mut log_charts
    } else {
        &mut no_charts
    };

    let summary = run_pipeline(&config, charts).context("Pipeline run failed")?;

    println!("{}", format_accuracy_report(&summary.accuracy));
    info!(
        cleaned_rows = summary.cleaned_rows,
        files = summary.written.len(),
        "outputs written"
    );
    Ok(())
}
