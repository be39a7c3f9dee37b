use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use remux::{config::RemuxConfig, ffmpeg::FfmpegRemuxer, run::RunError};
use std::path::PathBuf;

/// Batch .ts to .mp4 container remuxer with end-of-run reconciliation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the .ts recordings to convert
    #[arg(required_unless_present = "config")]
    source: Option<PathBuf>,

    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the output folder, created next to the source directory
    #[arg(short, long)]
    output_name: Option<String>,

    /// Path to the ffmpeg binary
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg_bin: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize logger - use RUST_LOG env var or default to info level
    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    if let Err(e) = run_batch().await {
        eprintln!("❌ {:#}", e);
        let code = if e.downcast_ref::<RunError>().is_some() { 2 } else { 1 };
        std::process::exit(code);
    }
}

async fn run_batch() -> Result<()> {
    let args = Args::parse();

    let mut cfg = RemuxConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(source) = args.source {
        cfg.source_dir = source;
    }
    if let Some(output_name) = args.output_name {
        cfg.output_folder_name = output_name;
    }

    info!("ts2mp4 starting");
    info!("  Source dir: {}", cfg.source_dir.display());
    info!("  Output dir: {}", cfg.output_dir().display());

    let remuxer = FfmpegRemuxer::with_binary(args.ffmpeg_bin);
    remux::run(&cfg, &remuxer).await?;
    Ok(())
}
