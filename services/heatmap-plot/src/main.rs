//! Heat map plotter.
//!
//! ```text
//! heatmap-plot <input> <output> shape:point width:1000 height:1000 radius:5 -smooth
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use heatmap_common::PlotError;
use heatmap_plot::{apply_params, open_sink, TextShapeSource};
use plot_engine::{CancelToken, CellFileIndex, PlotConfig, PlotSummary, Plotter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "heatmap-plot")]
#[command(about = "Plot a heat map of spatial shapes")]
struct Args {
    /// Input text file of shapes
    input: PathBuf,

    /// Output PNG file, or a directory for one PNG per tile
    output: PathBuf,

    /// Plot parameters: key:value pairs and -flags
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    params: Vec<String>,

    /// JSON configuration file, applied before environment and parameters
    #[arg(long, env = "HEATMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {}", e);
    }

    match run(args).await {
        Ok(summary) => {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!(error = %e, "Could not print run summary"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "Plot failed");
            let code = e
                .downcast_ref::<PlotError>()
                .map(PlotError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Args) -> Result<PlotSummary> {
    let mut config = match &args.config {
        Some(path) => PlotConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => PlotConfig::default(),
    };
    config.apply_env();
    let options = apply_params(&mut config, &args.params)?;
    config.validate()?;

    if options.background {
        warn!("-background has no effect on local runs");
    }
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        partition = %config.partition,
        "Starting heat map plot"
    );

    let source = TextShapeSource::open(&args.input, options.shape, options.splits)?;
    let index = options.index.map(CellFileIndex::new);
    let mut sink = open_sink(&args.output, &config)?;

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling plot");
            on_signal.cancel();
        }
    });

    let summary = tokio::task::spawn_blocking(move || {
        let mut plotter = Plotter::new(&config, &source).with_cancel(cancel);
        if let Some(index) = &index {
            plotter = plotter.with_index(index);
        }
        plotter.run(sink.as_mut())
    })
    .await
    .context("plot task panicked")??;

    info!(
        width = summary.width,
        height = summary.height,
        tiles = summary.tiles,
        "Heat map plot finished"
    );
    Ok(summary)
}
