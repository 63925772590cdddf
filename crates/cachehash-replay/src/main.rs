//! cachehash-replay - replay a key trace through an LRU cache

mod replay;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::replay::{Mode, Replayer};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trace file with one key per line (stdin if omitted)
    trace: Option<PathBuf>,

    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 10000)]
    capacity: usize,

    /// Look up with `has` instead of `get` (no promotion on hit)
    #[arg(long)]
    peek: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mode = if args.peek { Mode::Peek } else { Mode::Promote };

    info!("Starting cachehash-replay v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);
    info!("Lookup mode: {:?}", mode);

    let mut replayer = Replayer::new(args.capacity, mode)?;
    match &args.trace {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open trace {}", path.display()))?;
            replayer.run(BufReader::new(file))?;
        }
        None => {
            replayer.run(io::stdin().lock())?;
        }
    }
    let summary = replayer.finish();

    println!("requests:  {}", summary.requests);
    println!("hits:      {}", summary.hits);
    println!("misses:    {}", summary.misses);
    println!("evictions: {}", summary.evictions);
    println!("hit ratio: {:.4}", summary.hit_ratio());

    Ok(())
}
