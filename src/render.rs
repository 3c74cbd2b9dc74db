//! Crop application and device-fit rendering.
//!
//! Consumes the analyzer's per-page results and drives a [`DocumentSink`]
//! with the final crop rectangle and scaled page size for every page, in
//! strict original order. No page is ever dropped; a page with no detected
//! content arrives here with a full-page crop box.

use thiserror::Error;

use crate::analyzer::uniform_box;
use crate::detect::{CropBox, PageInfo};
use crate::device::DeviceProfile;
use crate::progress::{ProcessingStage, ProgressCallback};

/// Error from a document sink while emitting a page.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to emit page {page}: {reason}")]
    Page { page: usize, reason: String },

    #[error("failed to write output {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Receiver for the ordered sequence of output pages.
pub trait DocumentSink {
    /// Emit one output page: the crop region of the source page, scaled to
    /// `scaled_size`.
    fn push_page(
        &mut self,
        source_index: usize,
        crop: &CropBox,
        scaled_size: (f64, f64),
    ) -> Result<(), SinkError>;
}

/// Which side of a spread a page sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSide {
    Left,
    Right,
}

impl PageSide {
    pub fn opposite(self) -> PageSide {
        match self {
            PageSide::Left => PageSide::Right,
            PageSide::Right => PageSide::Left,
        }
    }
}

/// Binding direction of the source book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingDirection {
    /// Western binding; the first page is a right-hand page.
    #[default]
    LeftToRight,
    /// Japanese binding; the first page is a left-hand page.
    RightToLeft,
}

impl BindingDirection {
    /// Conventional side of page index 0 for this binding.
    pub fn first_page_side(self) -> PageSide {
        match self {
            BindingDirection::LeftToRight => PageSide::Right,
            BindingDirection::RightToLeft => PageSide::Left,
        }
    }
}

/// Manual crop margins as percentages of the page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SideMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl SideMargins {
    /// Apply the margins to a page rectangle.
    pub fn apply(&self, page_rect: &CropBox) -> CropBox {
        let w = page_rect.width();
        let h = page_rect.height();
        CropBox::new(
            page_rect.x0 + w * (self.left / 100.0),
            page_rect.y0 + h * (self.top / 100.0),
            page_rect.x1 - w * (self.right / 100.0),
            page_rect.y1 - h * (self.bottom / 100.0),
        )
    }
}

/// Spread-aware manual margins: independent left-hand and right-hand page
/// margins, selected by page-index parity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadMargins {
    /// Side of page index 0.
    pub first_page: PageSide,
    /// Margins for left-hand pages.
    pub left_page: SideMargins,
    /// Margins for right-hand pages.
    pub right_page: SideMargins,
}

impl SpreadMargins {
    /// Same margins on both sides (no spread awareness needed).
    pub fn uniform(margins: SideMargins) -> Self {
        Self {
            first_page: BindingDirection::default().first_page_side(),
            left_page: margins,
            right_page: margins,
        }
    }

    /// Margins differing per spread side, with the first-page side derived
    /// from the binding direction.
    pub fn for_binding(
        binding: BindingDirection,
        left_page: SideMargins,
        right_page: SideMargins,
    ) -> Self {
        Self {
            first_page: binding.first_page_side(),
            left_page,
            right_page,
        }
    }

    /// Spread side of the page at `index`, alternating from the first page.
    pub fn side_for(&self, index: usize) -> PageSide {
        if index % 2 == 0 {
            self.first_page
        } else {
            self.first_page.opposite()
        }
    }

    /// Margins for the page at `index`.
    pub fn margins_for(&self, index: usize) -> &SideMargins {
        match self.side_for(index) {
            PageSide::Left => &self.left_page,
            PageSide::Right => &self.right_page,
        }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Apply one union crop box to every page instead of per-page boxes.
    pub uniform: bool,
    /// Scale output pages to fit this device display.
    pub device: Option<DeviceProfile>,
    /// Manual margins overriding detected crop boxes.
    pub manual: Option<SpreadMargins>,
}

/// Uniform scale factor fitting a crop inside the device display without
/// exceeding it: `min(target_w / crop_w, target_h / crop_h)`.
pub fn fit_scale(crop_width: f64, crop_height: f64, device: &DeviceProfile) -> f64 {
    if crop_width <= 0.0 || crop_height <= 0.0 {
        return 1.0;
    }
    (device.width / crop_width).min(device.height / crop_height)
}

/// Applies crop boxes and emits output pages into a sink.
#[derive(Debug, Clone)]
pub struct CropRenderer {
    options: RenderOptions,
}

impl CropRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Final crop box for one page.
    fn crop_for(&self, info: &PageInfo, uniform: Option<&CropBox>) -> CropBox {
        if let Some(spread) = &self.options.manual {
            let page_rect = CropBox::full_page(info.original_size.0, info.original_size.1);
            return spread.margins_for(info.index).apply(&page_rect);
        }
        match uniform {
            Some(rect) => *rect,
            None => info.crop_box,
        }
    }

    /// Output page size for a crop box, device-fitted when configured.
    pub fn scaled_size(&self, crop: &CropBox) -> (f64, f64) {
        match &self.options.device {
            Some(device) => {
                let scale = fit_scale(crop.width(), crop.height(), device);
                (crop.width() * scale, crop.height() * scale)
            }
            None => (crop.width(), crop.height()),
        }
    }

    /// Push every page into the sink in original index order.
    pub fn render<S: DocumentSink>(
        &self,
        infos: &[PageInfo],
        sink: &mut S,
        progress: &dyn ProgressCallback,
    ) -> Result<(), SinkError> {
        let total = infos.len();
        progress.on_stage_start(ProcessingStage::Cropping);

        let uniform = if self.options.uniform {
            uniform_box(infos)
        } else {
            None
        };

        for (done, info) in infos.iter().enumerate() {
            let crop = self.crop_for(info, uniform.as_ref());
            let scaled = self.scaled_size(&crop);
            sink.push_page(info.index, &crop, scaled)?;
            progress.on_page_progress(ProcessingStage::Cropping, done + 1, total);
        }

        progress.on_stage_complete(ProcessingStage::Cropping);
        Ok(())
    }
}
