use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use futures::StreamExt;
use paintty::canvas::Canvas;
use paintty::types::{DiagnosticKind, ReplayEvent};
use paintty::{ReplayConfig, ReplaySession};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replay a recorded paint session onto a canvas and save it as PNG.
#[derive(Parser, Debug)]
#[command(name = "paintty", version)]
struct Cli {
    /// Canvas width in pixels.
    width: u32,

    /// Canvas height in pixels.
    height: u32,

    /// Session archive to replay.
    source: PathBuf,

    /// Output PNG path.
    destination: PathBuf,

    /// Drain documents as fast as they decode instead of one per tick.
    #[arg(short, long)]
    fullspeed: bool,

    /// Drain tick interval in milliseconds.
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,

    /// YAML replay configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save a numbered snapshot every N parsed blocks.
    #[arg(long = "export-every")]
    export_every: Option<u64>,

    /// Skip strokes recorded by this client id.
    #[arg(long = "suppress-client")]
    suppress_client: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.width > 0 && cli.height > 0, "canvas size must be non-zero");

    let config = build_config(&cli)?;
    let mut session = ReplaySession::open(&cli.source, config)
        .await
        .with_context(|| format!("open archive '{}'", cli.source.display()))?;
    let mut events = session.take_events().context("event stream already taken")?;

    let mut canvas = Canvas::new(cli.width, cli.height);
    let mut snapshots = 0u64;
    let mut parsed = false;

    while let Some(event) = events.next().await {
        match event {
            ReplayEvent::Draw(draw) => {
                if let Err(e) = canvas.apply(&draw) {
                    warn!(client_id = draw.client_id(), "Skipping draw event: {e}");
                }
            }
            ReplayEvent::BlockParsed { sequence } => {
                if let Some(every) = cli.export_every.filter(|n| *n > 0)
                    && (sequence + 1) % every == 0
                {
                    let path = snapshot_path(&cli.destination, snapshots);
                    canvas.save_png(&path).with_context(|| format!("write snapshot '{}'", path.display()))?;
                    snapshots += 1;
                }
            }
            ReplayEvent::Diagnostic(diagnostic) => {
                if diagnostic.kind == DiagnosticKind::TruncatedFrame {
                    warn!("Archive ends mid-frame: {}", diagnostic.message);
                }
            }
            ReplayEvent::ArchiveParsed => {
                canvas
                    .save_png(&cli.destination)
                    .with_context(|| format!("write png '{}'", cli.destination.display()))?;
                parsed = true;
            }
        }
    }

    let summary = session.finish().await.context("replay failed")?;
    anyhow::ensure!(parsed, "replay ended before the archive was parsed");

    info!(
        blocks = summary.blocks_parsed,
        dropped = summary.packets_dropped,
        snapshots,
        "Wrote {}",
        cli.destination.display()
    );
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<ReplayConfig> {
    let mut config = match &cli.config {
        Some(path) => ReplayConfig::load(path).with_context(|| format!("load config '{}'", path.display()))?,
        None => ReplayConfig::default(),
    };
    if cli.fullspeed {
        config = config.fullspeed(true);
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if let Some(client) = &cli.suppress_client {
        config.suppress_client_id = Some(client.clone());
    }
    config.validate()?;
    Ok(config)
}

fn snapshot_path(destination: &Path, index: u64) -> PathBuf {
    let stem = destination.file_stem().and_then(|s| s.to_str()).unwrap_or("snapshot");
    destination.with_file_name(format!("{stem}-{index:06}.png"))
}
