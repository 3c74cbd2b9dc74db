//! Shared types for content-bounds detection.

use serde::{Deserialize, Serialize};

/// Axis-aligned crop rectangle in page coordinates (points, top-left origin).
///
/// Invariant: `x1 >= x0` and `y1 >= y0`. A box is computed once per page (or
/// once per run for a uniform crop) and treated as immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl CropBox {
    /// Create a new crop box. Edges are normalized so the invariant holds.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Full-page box for a page of the given size with origin at (0, 0).
    pub fn full_page(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Bounding union of two boxes (min of lower edges, max of upper edges).
    pub fn union(&self, other: &CropBox) -> CropBox {
        CropBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Whether `other` lies entirely within this box.
    pub fn contains(&self, other: &CropBox) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }
}

/// Per-page analysis result.
///
/// Created once during analysis and read-only afterwards; the render engine
/// borrows the list of these to emit the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// 0-based page index.
    pub index: usize,
    /// Original page size (width, height) in points.
    pub original_size: (f64, f64),
    /// Detected content crop box.
    pub crop_box: CropBox,
    /// Crop area divided by original page area, in (0, 1].
    pub content_ratio: f64,
}

impl PageInfo {
    /// Build a `PageInfo`, guarding the ratio against zero-area pages.
    pub fn new(index: usize, original_size: (f64, f64), crop_box: CropBox) -> Self {
        let original_area = original_size.0 * original_size.1;
        let content_ratio = if original_area > 0.0 {
            crop_box.area() / original_area
        } else {
            1.0
        };
        Self {
            index,
            original_size,
            crop_box,
            content_ratio,
        }
    }
}
