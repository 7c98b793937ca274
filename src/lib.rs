//! Thumb-snip — screen region to normalized, optionally compressed thumbnail.
//!
//! The library wires together:
//! - Capture domain (capture/): selection mapping, crop/resize, display grab
//! - Compression domain (compress/): authenticated remote workflow
//! - Pipeline (pipeline.rs): the single entry point callers use
//! - Configuration (config.rs) and the CLI entry point below

mod args;
pub mod capture;
pub mod compress;
pub mod config;
pub mod pipeline;

pub use capture::{
    OutputFormat, OutputSettings, PixelCropRegion, RawCapture, SelectionBounds, TargetImage,
    ViewportMetrics,
};
pub use compress::{CancellationToken, CompressionClient, CompressionOutcome};
pub use config::Config;
pub use pipeline::{CaptureResult, CapturePipeline, PipelineError};

use args::Args;
use capture::PrimaryMonitorSource;
use clap::Parser;
use std::sync::Arc;

/// Entry point for the `thumb-snip` binary. Returns the process exit code.
pub fn run() -> i32 {
    env_logger::init();
    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return 2;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return 1;
        }
    };

    match runtime.block_on(snip(args, config)) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("Capture failed: {}", e);
            eprintln!("Capture failed: {}", e);
            1
        }
    }
}

async fn snip(args: Args, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let selection = match args.height {
        Some(height) => SelectionBounds::new(args.x, args.y, args.width, height),
        None => SelectionBounds::aspect_locked(args.x, args.y, args.width),
    };

    let pipeline = if args.no_compress {
        CapturePipeline::without_compression(config.output)
    } else {
        if config.compression.public_key.is_none() {
            log::warn!("[CONFIG] SNIP_PUBLIC_KEY is not set — the image will not be compressed");
        }
        CapturePipeline::from_config(&config)
    };

    // Ctrl-C abandons compression but still saves the uncompressed image
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted — cancelling compression");
            on_interrupt.cancel();
        }
    });

    let result = pipeline
        .capture_display(
            Arc::new(PrimaryMonitorSource),
            selection,
            args.template.as_deref(),
            &cancel,
        )
        .await?;

    let path = match &args.output {
        Some(dir) => result.save_to(dir)?,
        None => result.save_to_downloads()?,
    };

    println!("{}", path.display());
    println!("{}", result.compression.summary());
    Ok(())
}
