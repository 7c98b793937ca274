use clap::Parser;
use std::path::PathBuf;

/// Snip a 16:9 region of the primary display into a thumbnail.
#[derive(Debug, Parser)]
#[command(name = "thumb-snip", version)]
pub struct Args {
    /// Left edge of the selection, in logical display units
    #[arg(long, allow_negative_numbers = true)]
    pub x: f64,
    /// Top edge of the selection, in logical display units
    #[arg(long, allow_negative_numbers = true)]
    pub y: f64,
    /// Selection width, in logical display units
    #[arg(long)]
    pub width: f64,
    /// Selection height; derived from a 16:9 ratio when omitted
    #[arg(long)]
    pub height: Option<f64>,
    /// Base name of the output file
    #[arg(short, long)]
    pub template: Option<String>,
    /// Directory to save into (defaults to the download directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Skip the remote compression step
    #[arg(long)]
    pub no_compress: bool,
}
