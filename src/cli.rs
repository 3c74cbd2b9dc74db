//! CLI interface module
//!
//! Provides command-line interface using clap derive macros.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Exit codes for the CLI
///
/// These codes follow standard Unix conventions and provide
/// specific error categories for scripting and automation.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGS: i32 = 2;
    pub const INPUT_NOT_FOUND: i32 = 3;
    pub const OUTPUT_ERROR: i32 = 4;
    pub const PROCESSING_ERROR: i32 = 5;
}

/// PDF recropper and rescaler for e-reader displays
#[derive(Parser, Debug)]
#[command(name = "pagefit-pdf")]
#[command(version)]
#[command(about = "Detect content bounds in PDFs and recrop them for e-reader displays", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect content bounds and write recropped, device-fitted PDFs
    Convert(ConvertArgs),
    /// Apply fixed percentage margins without content detection
    Crop(CropArgs),
    /// Analyze a sample of pages and report crop boxes without writing
    Preview(PreviewArgs),
    /// Show system information
    Info,
}

/// Arguments for the convert command
#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Input PDF file or directory
    pub input: PathBuf,

    /// Output directory
    #[arg(default_value = "./output")]
    pub output: PathBuf,

    /// Target device profile (paperwhite, oasis, basic, scribe)
    #[arg(short = 'D', long, default_value = "paperwhite")]
    pub device: String,

    /// Keep original page size, no device scaling
    #[arg(long)]
    pub no_device: bool,

    /// Detection mode (text, components, threshold)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Binarization threshold, 0 selects Otsu auto-thresholding
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Margin fraction around detected bounds
    #[arg(long, default_value_t = 0.005)]
    pub margin: f64,

    /// Detection DPI
    #[arg(long, default_value_t = 150)]
    pub dpi: u32,

    /// Crop each page to its own bounds instead of one shared box
    #[arg(long)]
    pub per_page: bool,

    /// Number of parallel threads
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON report of detected crop boxes to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip files whose output already exists
    #[arg(short, long)]
    pub skip_existing: bool,

    /// Re-process even if output exists
    #[arg(short, long)]
    pub force: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Show execution plan without processing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the crop command
#[derive(clap::Args, Debug)]
pub struct CropArgs {
    /// Input PDF file
    pub input: PathBuf,

    /// Output PDF file (defaults to <input>_optimized.pdf)
    pub output: Option<PathBuf>,

    /// Left margin to remove, percent of page width
    #[arg(long, default_value_t = 0.0)]
    pub left: f64,

    /// Right margin to remove, percent of page width
    #[arg(long, default_value_t = 0.0)]
    pub right: f64,

    /// Top margin to remove, percent of page height
    #[arg(long, default_value_t = 0.0)]
    pub top: f64,

    /// Bottom margin to remove, percent of page height
    #[arg(long, default_value_t = 0.0)]
    pub bottom: f64,

    /// Binding direction for spread-aware margins (ltr, rtl)
    #[arg(long)]
    pub binding: Option<String>,

    /// Spine-side margin, percent; requires --binding
    #[arg(long, requires = "binding")]
    pub inner: Option<f64>,

    /// Outer-edge margin, percent; requires --binding
    #[arg(long, requires = "binding")]
    pub outer: Option<f64>,

    /// Target device profile; omit to keep original size
    #[arg(short = 'D', long)]
    pub device: Option<String>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the preview command
#[derive(clap::Args, Debug)]
pub struct PreviewArgs {
    /// Input PDF file
    pub input: PathBuf,

    /// Number of randomly sampled pages to analyze
    #[arg(short = 'n', long, default_value_t = 5)]
    pub pages: usize,

    /// Detection mode (text, components, threshold)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Detection DPI
    #[arg(long, default_value_t = 150)]
    pub dpi: u32,

    /// Margin fraction around detected bounds
    #[arg(long, default_value_t = 0.005)]
    pub margin: f64,

    /// Write the report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Save the sampled pages as grayscale PNGs into this directory
    #[arg(long, value_name = "DIR")]
    pub save_images: Option<PathBuf>,
}

/// Create a styled progress bar for file processing
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb
}

/// Create a progress bar for page processing
pub fn create_page_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] Page {pos}/{len} ({percent}%) - {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓░"),
    );
    pb
}
