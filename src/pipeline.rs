//! End-to-end document processing.
//!
//! A [`Pipeline`] ties the pieces together for one document: open the PDF,
//! analyze every page for content bounds, then write a recropped (and
//! optionally device-scaled) copy.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::analyzer::{uniform_box, PageAnalyzer, PageSource, SourceError};
use crate::detect::{CropBox, DetectOptions, DetectionMode, PageInfo};
use crate::device::DeviceProfile;
use crate::pdf::{PdfError, PdfReader, PdfWriter};
use crate::progress::{ProcessingStage, ProgressCallback};
use crate::render::{CropRenderer, RenderOptions, SinkError, SpreadMargins};

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("failed to configure thread pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Full configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Detection mode.
    pub mode: DetectionMode,
    /// Binarization threshold (0 = Otsu).
    pub threshold: u8,
    /// Margin fraction around detected bounds.
    pub margin_fraction: f64,
    /// Rasterization DPI.
    pub dpi: u32,
    /// Minimum character size in pixels at 150 DPI.
    pub min_char_size: u32,
    /// Maximum character size in pixels at 150 DPI.
    pub max_char_size: u32,
    /// Minimum pixel count per content component.
    pub min_content_pixels: u32,
    /// Apply one union crop box to every page.
    pub uniform: bool,
    /// Scale pages to fit this device.
    pub device: Option<DeviceProfile>,
    /// Worker thread count; `None` uses all cores.
    pub threads: Option<usize>,
    /// Skip files whose output already exists.
    pub skip_existing: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let detect = DetectOptions::default();
        Self {
            mode: detect.mode,
            threshold: detect.threshold,
            margin_fraction: detect.margin_fraction,
            dpi: detect.dpi,
            min_char_size: detect.min_char_size,
            max_char_size: detect.max_char_size,
            min_content_pixels: detect.min_content_pixels,
            uniform: true,
            device: None,
            threads: None,
            skip_existing: false,
        }
    }
}

impl PipelineConfig {
    /// Detection options for this configuration.
    pub fn detect_options(&self) -> DetectOptions {
        DetectOptions::builder()
            .mode(self.mode)
            .threshold(self.threshold)
            .margin_fraction(self.margin_fraction)
            .dpi(self.dpi)
            .min_char_size(self.min_char_size)
            .max_char_size(self.max_char_size)
            .min_content_pixels(self.min_content_pixels)
            .build()
    }

    #[must_use]
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: DetectionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_margin(mut self, fraction: f64) -> Self {
        self.margin_fraction = fraction;
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: Option<DeviceProfile>) -> Self {
        self.device = device;
        self
    }

    #[must_use]
    pub fn with_uniform(mut self, uniform: bool) -> Self {
        self.uniform = uniform;
        self
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub pages: Vec<PageInfo>,
    pub uniform_box: Option<CropBox>,
    pub device: Option<String>,
}

/// Analysis-only report for a sample of pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewReport {
    pub input: PathBuf,
    pub page_count: usize,
    pub sampled: Vec<PageInfo>,
    pub uniform_box: Option<CropBox>,
}

/// Processing pipeline for PDF documents.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detect content bounds on every page and write a recropped copy.
    pub fn optimize(
        &self,
        input: &Path,
        output: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<OptimizeResult> {
        let reader = PdfReader::open(input)?;
        info!(
            input = %input.display(),
            pages = reader.page_count(),
            "analyzing document"
        );

        let pages = self.analyze(&reader, progress)?;
        let union = uniform_box(&pages);

        let renderer = CropRenderer::new(RenderOptions {
            uniform: self.config.uniform,
            device: self.config.device,
            manual: None,
        });
        self.write_output(&reader, &pages, &renderer, output, progress)?;

        Ok(OptimizeResult {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            pages,
            uniform_box: union,
            device: self.config.device.map(|d| d.name.to_string()),
        })
    }

    /// Apply fixed per-side margins without content detection.
    pub fn crop_manual(
        &self,
        input: &Path,
        output: &Path,
        margins: SpreadMargins,
        progress: &dyn ProgressCallback,
    ) -> Result<OptimizeResult> {
        let reader = PdfReader::open(input)?;

        // Full-page placeholders; the renderer derives the crop from the
        // margins, not from these boxes.
        let pages: Vec<PageInfo> = (0..reader.page_count())
            .map(|index| {
                let rect = reader.page_rect(index)?;
                Ok(PageInfo::new(index, (rect.width(), rect.height()), rect))
            })
            .collect::<Result<_>>()?;

        let renderer = CropRenderer::new(RenderOptions {
            uniform: false,
            device: self.config.device,
            manual: Some(margins),
        });
        self.write_output(&reader, &pages, &renderer, output, progress)?;

        Ok(OptimizeResult {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            pages,
            uniform_box: None,
            device: self.config.device.map(|d| d.name.to_string()),
        })
    }

    /// Analyze a random sample of pages without writing anything.
    pub fn preview(
        &self,
        input: &Path,
        sample_size: usize,
        progress: &dyn ProgressCallback,
    ) -> Result<PreviewReport> {
        let reader = PdfReader::open(input)?;
        let total = reader.page_count();

        let mut indices: Vec<usize> = if total <= sample_size {
            (0..total).collect()
        } else {
            let mut rng = rand::thread_rng();
            rand::seq::index::sample(&mut rng, total, sample_size).into_vec()
        };
        indices.sort_unstable();

        let analyzer = PageAnalyzer::new(self.config.detect_options());
        progress.on_stage_start(ProcessingStage::Analyzing);
        let mut sampled = Vec::with_capacity(indices.len());
        for (done, &index) in indices.iter().enumerate() {
            sampled.push(analyzer.analyze_page(&reader, index)?);
            progress.on_page_progress(ProcessingStage::Analyzing, done + 1, indices.len());
        }
        progress.on_stage_complete(ProcessingStage::Analyzing);

        let union = uniform_box(&sampled);
        Ok(PreviewReport {
            input: input.to_path_buf(),
            page_count: total,
            sampled,
            uniform_box: union,
        })
    }

    fn analyze(
        &self,
        reader: &PdfReader,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<PageInfo>> {
        let analyzer = PageAnalyzer::new(self.config.detect_options());
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads.max(1))
                    .build()
                    .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;
                pool.install(|| analyzer.analyze_all(reader, progress))
                    .map_err(PipelineError::from)
            }
            None => analyzer
                .analyze_all(reader, progress)
                .map_err(PipelineError::from),
        }
    }

    fn write_output(
        &self,
        reader: &PdfReader,
        pages: &[PageInfo],
        renderer: &CropRenderer,
        output: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<()> {
        let mut writer = PdfWriter::new(reader.clone_document(), output);
        renderer.render(pages, &mut writer, progress)?;

        progress.on_stage_start(ProcessingStage::WritingPdf);
        let saved = writer.finish()?;
        progress.on_stage_complete(ProcessingStage::WritingPdf);
        info!(output = %saved.display(), "wrote output");
        Ok(())
    }
}

/// Default output path next to the input: `book.pdf` -> `book_optimized.pdf`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_optimized.pdf"))
}
