//! pagefit-pdf - PDF recropping and rescaling for e-reader displays
//!
//! Detects the content region of every page in a PDF, trims the surrounding
//! margins, and scales the result to fit a target e-reader display.
//! Detection prefers the page's text layout and falls back to an image
//! pipeline (Otsu binarization plus connected-component filtering) for
//! scanned pages.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use pagefit_pdf::{DeviceProfile, NoProgress, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::default()
//!     .with_device(Some(DeviceProfile::lookup("paperwhite")));
//! let pipeline = Pipeline::new(config);
//! let result = pipeline
//!     .optimize(Path::new("book.pdf"), Path::new("book_optimized.pdf"), &NoProgress)
//!     .unwrap();
//! println!("{} pages recropped", result.pages.len());
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod detect;
pub mod device;
pub mod pdf;
pub mod pipeline;
pub mod progress;
pub mod render;

// Re-export main types for convenient access
pub use analyzer::{uniform_box, PageAnalyzer, PageSource, SourceError};
pub use cli::{
    exit_codes, Cli, Commands, ConvertArgs, CropArgs, PreviewArgs,
};
pub use config::{parse_mode, CliOverrides, Config, ConfigError};
pub use detect::{CropBox, DetectOptions, DetectionMode, PageInfo};
pub use device::{DeviceProfile, DEVICE_PROFILES};
pub use pdf::{PdfError, PdfReader, PdfWriter};
pub use pipeline::{
    default_output_path, OptimizeResult, Pipeline, PipelineConfig, PipelineError, PreviewReport,
};
pub use progress::{print_summary, NoProgress, ProcessingStage, ProgressCallback};
pub use render::{
    fit_scale, BindingDirection, CropRenderer, DocumentSink, PageSide, RenderOptions, SideMargins,
    SinkError, SpreadMargins,
};
