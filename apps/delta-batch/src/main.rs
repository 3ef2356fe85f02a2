mod batch;

use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Computes lap deltas for recorded sessions and writes map geometry.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Lap file (`.csv`, otherwise NDJSON of lap records)
    pub input: PathBuf,

    /// Only process this session (defaults to every session in the file)
    #[arg(long)]
    pub session: Option<Uuid>,

    /// Delta output (`.ndjson` for NDJSON, otherwise CSV)
    #[arg(short, long, default_value = "deltas.csv")]
    pub out: PathBuf,

    /// Engine tuning JSON
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the track map of this lap
    #[arg(long)]
    pub map_lap: Option<Uuid>,

    #[arg(long, default_value = "track_map.json")]
    pub map_out: PathBuf,

    #[arg(short, long)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    batch::run(cli).await
}
