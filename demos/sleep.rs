//! Walk a directory and "process" every file by sleeping for a moment.
//!
//! ```bash
//! cargo run --example sleep -- ~/src --workers 10 --batch-size 10 --update-every 1 --refresh-rate 10
//! ```

use anyhow::Result;
use clap::Parser;
use parapply::{ApplyConfig, ParallelApplier};
use std::path::PathBuf;
use std::time::Duration;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "sleep",
    about = "Apply a slow function to every file under a directory, in parallel batches"
)]
struct Args {
    /// Directory to walk
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Maximum depth to descend
    #[arg(long, default_value_t = 2)]
    max_depth: usize,

    /// Milliseconds to sleep per file
    #[arg(long, default_value_t = 100)]
    sleep_ms: u64,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short, long, env = "PARAPPLY_NUM_WORKERS")]
    workers: Option<usize>,

    /// Files per batch
    #[arg(short, long, default_value_t = 10)]
    batch_size: usize,

    /// Emit a progress step every N files
    #[arg(long, default_value_t = 1)]
    update_every: usize,

    /// Progress redraws per second
    #[arg(long, default_value_t = 10)]
    refresh_rate: u8,

    /// Disable progress rows
    #[arg(long)]
    no_progress: bool,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let files: Vec<PathBuf> = WalkDir::new(&args.root)
        .max_depth(args.max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    println!("Processing {} files", files.len());

    let mut config = ApplyConfig::default()
        .with_batch_size(args.batch_size)
        .with_update_every(args.update_every)
        .with_refresh_rate(args.refresh_rate)
        .with_progress(!args.no_progress);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    let pause = Duration::from_millis(args.sleep_ms);
    let applier = ParallelApplier::new(config)?;
    let processed = applier.run(&files, |path| {
        std::thread::sleep(pause);
        Ok(path.metadata()?.len())
    })?;

    let total_bytes: u64 = processed.iter().sum();
    println!(
        "Processed {} of {} files ({} bytes)",
        processed.len(),
        files.len(),
        total_bytes
    );
    Ok(())
}
