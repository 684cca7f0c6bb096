//! Replay recorded hand frames through the gesture pipeline.
//!
//! Reads newline-delimited JSON `HandFrame`s and prints gesture updates as
//! JSON lines on stdout. Logs go to stderr.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use handsign_engine::{EngineConfig, GesturePipeline, ReplayFrameSource};

/// Replay recorded hand frames and print gesture transitions
#[derive(Parser, Debug)]
#[command(name = "handsign-replay")]
#[command(author, version, about)]
struct Cli {
    /// Recorded frames, one JSON object per line
    #[arg(short, long)]
    input: PathBuf,

    /// Engine configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print every per-frame update, not only transitions
    #[arg(long)]
    all: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("handsign=info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::from_env().context("loading config from environment")?,
    };

    let file = File::open(&cli.input)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let source = ReplayFrameSource::from_ndjson(BufReader::new(file))
        .with_context(|| format!("reading frames from {}", cli.input.display()))?;
    info!(frames = source.remaining(), "replaying {}", cli.input.display());

    let mut pipeline = GesturePipeline::new(config)?;
    let mut updates = pipeline.start_streaming(source).await?;

    let mut transitions = 0usize;
    while let Some(update) = updates.recv().await {
        if update.transition.is_some() {
            transitions += 1;
        } else if !cli.all {
            continue;
        }
        println!("{}", serde_json::to_string(&update)?);
    }

    pipeline.stop().await;
    info!(transitions, "replay finished");
    Ok(())
}
