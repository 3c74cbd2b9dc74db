//! Per-page content analysis and aggregation.
//!
//! The analyzer drives the detection core over an abstract [`PageSource`]:
//! text-layout detection first when enabled, then the image pipeline for
//! pages without usable text. Results are plain values; nothing is shared
//! across documents or runs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::GrayImage;
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::detect::{
    binarize, detect_text_bounds, extract_bounds, refine_mask, CropBox, DetectOptions,
    DetectionMode, PageInfo, TextBounds, TextSpan,
};
use crate::progress::{ProcessingStage, ProgressCallback};

/// Errors surfaced by a page source.
///
/// Detection itself never fails; only reading or rasterizing the underlying
/// document can.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The page dictionary or geometry could not be read.
    #[error("failed to read page {page}: {reason}")]
    Page { page: usize, reason: String },

    /// Rasterization failed.
    #[error("failed to render page {page} at {dpi} dpi: {reason}")]
    Render { page: usize, dpi: u32, reason: String },

    /// An underlying I/O failure with path context.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Abstract provider of pages to analyze.
///
/// Implementations must be `Sync`: per-page detection is a pure function of
/// the page input and parameters, so pages may be analyzed in parallel.
pub trait PageSource: Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Original page rectangle in points (top-left origin).
    fn page_rect(&self, index: usize) -> Result<CropBox, SourceError>;

    /// Render the page to a grayscale bitmap at the given DPI.
    fn render_grayscale(&self, index: usize, dpi: u32) -> Result<GrayImage, SourceError>;

    /// Structured text spans for the page. An empty vector means "no text
    /// layout available" and triggers image-based fallback; it is not an
    /// error.
    fn text_spans(&self, index: usize) -> Result<Vec<TextSpan>, SourceError>;
}

/// Orchestrates detection across the pages of one document.
#[derive(Debug, Clone)]
pub struct PageAnalyzer {
    options: DetectOptions,
}

impl PageAnalyzer {
    pub fn new(options: DetectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DetectOptions {
        &self.options
    }

    /// Analyze one page and return its [`PageInfo`].
    ///
    /// In [`DetectionMode::Text`] the text layout is tried first; a found
    /// box is used directly and the image path is skipped entirely. Pages
    /// with no detectable content fail open to a full-page crop.
    pub fn analyze_page<S: PageSource + ?Sized>(
        &self,
        source: &S,
        index: usize,
    ) -> Result<PageInfo, SourceError> {
        let page_rect = source.page_rect(index)?;
        let original_size = (page_rect.width(), page_rect.height());

        if self.options.mode == DetectionMode::Text {
            let spans = source.text_spans(index)?;
            if let TextBounds::Found(rect) =
                detect_text_bounds(&spans, &page_rect, self.options.margin_fraction)
            {
                debug!(page = index, spans = spans.len(), "text bounds found");
                return Ok(PageInfo::new(index, original_size, rect));
            }
            debug!(page = index, "no text layout, falling back to image detection");
        }

        let gray = source.render_grayscale(index, self.options.dpi)?;
        let mask = binarize(&gray, self.options.threshold);
        let mask = match self.options.mode {
            DetectionMode::Threshold => mask,
            _ => refine_mask(&mask, &self.options.component_filter()),
        };

        let crop_box = extract_bounds(
            &mask,
            self.options.dpi,
            self.options.margin_fraction,
            &page_rect,
        );
        Ok(PageInfo::new(index, original_size, crop_box))
    }

    /// Analyze every page, reporting monotonic progress after each one.
    ///
    /// Pages are analyzed in parallel but the returned list is strictly in
    /// original page order.
    pub fn analyze_all<S: PageSource + ?Sized>(
        &self,
        source: &S,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<PageInfo>, SourceError> {
        let total = source.page_count();
        progress.on_stage_start(ProcessingStage::Analyzing);

        let done = AtomicUsize::new(0);
        let infos: Vec<PageInfo> = (0..total)
            .into_par_iter()
            .map(|index| {
                let info = self.analyze_page(source, index)?;
                let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                progress.on_page_progress(ProcessingStage::Analyzing, current, total);
                Ok(info)
            })
            .collect::<Result<_, SourceError>>()?;

        progress.on_stage_complete(ProcessingStage::Analyzing);
        Ok(infos)
    }
}

/// Bounding union of all per-page crop boxes.
///
/// Used when a single consistent crop across the whole document is wanted,
/// avoiding crop jitter between pages. `None` for an empty list.
pub fn uniform_box(infos: &[PageInfo]) -> Option<CropBox> {
    let mut iter = infos.iter().map(|p| p.crop_box);
    let first = iter.next()?;
    Some(iter.fold(first, |acc, b| acc.union(&b)))
}
