//! Content-bounds detection core.
//!
//! Finds the content (non-margin) region of a page using either the page's
//! structured text layout or an image pipeline: binarization (fixed or Otsu
//! threshold), connected-component filtering with edge-shadow rejection, and
//! bounding-box extraction with margin padding.
//!
//! # Example
//!
//! ```rust
//! use pagefit_pdf::{detect, DetectOptions, DetectionMode};
//!
//! let options = DetectOptions::builder()
//!     .mode(DetectionMode::Components)
//!     .dpi(150)
//!     .margin_fraction(0.02)
//!     .build();
//!
//! assert_eq!(options.dpi, 150);
//! # let _ = detect::binarize::BinaryMask::new(1, 1);
//! ```

pub mod binarize;
pub mod bounds;
pub mod components;
pub mod text;
mod types;

pub use binarize::{binarize, otsu_from_histogram, otsu_threshold, threshold_mask, BinaryMask};
pub use bounds::extract_bounds;
pub use components::{
    dilate, filter_components, label_components, refine_mask, Component, ComponentFilterOptions,
};
pub use text::{detect_text_bounds, TextBounds, TextSpan};
pub use types::{CropBox, PageInfo};

// ============================================================
// Constants
// ============================================================

/// Default binarization threshold; darker pixels count as content.
const DEFAULT_THRESHOLD: u8 = 250;

/// Default margin fraction added around detected bounds.
const DEFAULT_MARGIN_FRACTION: f64 = 0.02;

/// Default detection DPI.
const DEFAULT_DPI: u32 = 150;

// ============================================================
// Options
// ============================================================

/// How page content bounds are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionMode {
    /// Use the page's text layout first, falling back to the component
    /// pipeline for pages without text (scans). Most accurate for
    /// digitally-typeset documents.
    #[default]
    Text,
    /// Binarize and filter connected components; for scanned documents.
    Components,
    /// Plain threshold mask without component filtering.
    Threshold,
}

/// Detection parameters, resolved by the host and passed into the core.
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Detection mode.
    pub mode: DetectionMode,
    /// Binarization threshold (0-255); 0 selects Otsu auto-thresholding.
    pub threshold: u8,
    /// Margin fraction added around the detected bounds.
    pub margin_fraction: f64,
    /// DPI used for page rasterization.
    pub dpi: u32,
    /// Minimum character size in pixels at 150 DPI.
    pub min_char_size: u32,
    /// Maximum character size in pixels at 150 DPI.
    pub max_char_size: u32,
    /// Minimum pixel count for a component to count as content.
    pub min_content_pixels: u32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        let components = ComponentFilterOptions::default();
        Self {
            mode: DetectionMode::default(),
            threshold: DEFAULT_THRESHOLD,
            margin_fraction: DEFAULT_MARGIN_FRACTION,
            dpi: DEFAULT_DPI,
            min_char_size: components.min_char_size,
            max_char_size: components.max_char_size,
            min_content_pixels: components.min_content_pixels,
        }
    }
}

impl DetectOptions {
    /// Create a new options builder.
    pub fn builder() -> DetectOptionsBuilder {
        DetectOptionsBuilder::default()
    }

    /// Component filter parameters at this configuration's DPI.
    pub fn component_filter(&self) -> ComponentFilterOptions {
        ComponentFilterOptions {
            dpi: self.dpi,
            min_char_size: self.min_char_size,
            max_char_size: self.max_char_size,
            min_content_pixels: self.min_content_pixels,
        }
    }
}

/// Builder for [`DetectOptions`].
#[derive(Debug, Default)]
pub struct DetectOptionsBuilder {
    options: DetectOptions,
}

impl DetectOptionsBuilder {
    /// Set the detection mode.
    #[must_use]
    pub fn mode(mut self, mode: DetectionMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Set the binarization threshold (0 = Otsu).
    #[must_use]
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.options.threshold = threshold;
        self
    }

    /// Set the margin fraction (clamped to 0.0-0.5).
    #[must_use]
    pub fn margin_fraction(mut self, fraction: f64) -> Self {
        self.options.margin_fraction = fraction.clamp(0.0, 0.5);
        self
    }

    /// Set the detection DPI (clamped to 72-600).
    #[must_use]
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.options.dpi = dpi.clamp(72, 600);
        self
    }

    /// Set the minimum character size.
    #[must_use]
    pub fn min_char_size(mut self, size: u32) -> Self {
        self.options.min_char_size = size;
        self
    }

    /// Set the maximum character size.
    #[must_use]
    pub fn max_char_size(mut self, size: u32) -> Self {
        self.options.max_char_size = size;
        self
    }

    /// Set the minimum content pixel count.
    #[must_use]
    pub fn min_content_pixels(mut self, pixels: u32) -> Self {
        self.options.min_content_pixels = pixels;
        self
    }

    /// Build the options.
    #[must_use]
    pub fn build(self) -> DetectOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = DetectOptions::default();
        assert_eq!(opts.mode, DetectionMode::Text);
        assert_eq!(opts.threshold, 250);
        assert_eq!(opts.dpi, 150);
        assert_eq!(opts.min_char_size, 8);
        assert_eq!(opts.max_char_size, 200);
        assert_eq!(opts.min_content_pixels, 50);
    }

    #[test]
    fn test_builder() {
        let opts = DetectOptions::builder()
            .mode(DetectionMode::Components)
            .threshold(0)
            .margin_fraction(0.01)
            .dpi(300)
            .min_char_size(6)
            .max_char_size(400)
            .min_content_pixels(30)
            .build();

        assert_eq!(opts.mode, DetectionMode::Components);
        assert_eq!(opts.threshold, 0);
        assert_eq!(opts.margin_fraction, 0.01);
        assert_eq!(opts.dpi, 300);
        assert_eq!(opts.min_char_size, 6);
        assert_eq!(opts.max_char_size, 400);
        assert_eq!(opts.min_content_pixels, 30);
    }

    #[test]
    fn test_builder_clamping() {
        let opts = DetectOptions::builder()
            .margin_fraction(2.0)
            .dpi(10_000)
            .build();
        assert_eq!(opts.margin_fraction, 0.5);
        assert_eq!(opts.dpi, 600);
    }

    #[test]
    fn test_component_filter_inherits_dpi() {
        let opts = DetectOptions::builder().dpi(300).min_char_size(10).build();
        let filter = opts.component_filter();
        assert_eq!(filter.dpi, 300);
        assert_eq!(filter.min_char_size, 10);
    }
}
