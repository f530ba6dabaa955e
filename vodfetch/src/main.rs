use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::warn;
use tokio_util::sync::CancellationToken;
use vodfetch::{Config, Pipeline, load_config};

#[derive(Debug, Parser)]
#[command(name = "vodfetch", version, about = "Concurrent HLS VOD downloader")]
struct Cli {
    /// Address of the media playlist to fetch
    url: String,

    /// Base name of the merged output file
    #[arg(short, long, default_value = "output")]
    output: String,

    /// Number of download workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Path of a YAML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn app_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if let Some(workers) = cli.workers {
        config.workers = Some(workers);
    }

    let pipeline = Pipeline::new(config)?;

    let cancel = CancellationToken::new();
    let interrupt_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping in-flight downloads");
            interrupt_cancel.cancel();
        }
    });

    let report = pipeline.run(&cli.url, &cli.output, &cancel).await?;

    println!(
        "Merged {} of {} segments into {}",
        report.merged,
        report.segments,
        report.output_path.display()
    );
    if !report.dropped.is_empty() {
        println!("Dropped sequences: {:?}", report.dropped);
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(e) = app_entry().await {
        panic!("Fatal error: {}", e);
    }
}
