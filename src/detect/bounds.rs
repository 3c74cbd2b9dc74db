//! Bounding-box extraction from a content mask.
//!
//! Reduces a (refined or raw) binary mask to a crop box in page points,
//! with margin padding. Fails open to the full page rectangle when the mask
//! has no set pixel, so an undetectable page is never cropped away.

use super::binarize::BinaryMask;
use super::types::CropBox;

/// PDF user-space resolution in points per inch.
const POINTS_PER_INCH: f64 = 72.0;

/// Extract the content crop box from a mask rendered at `dpi`.
///
/// The mask bounds are expanded by `margin_fraction` of the image dimensions
/// on each side, clamped to the image, then converted to page points by
/// dividing by the render zoom (`dpi / 72`).
pub fn extract_bounds(
    mask: &BinaryMask,
    dpi: u32,
    margin_fraction: f64,
    page_rect: &CropBox,
) -> CropBox {
    let img_width = mask.width();
    let img_height = mask.height();

    let mut min_x = None;
    let mut max_x = None;
    let mut min_y = None;
    let mut max_y = None;

    for y in 0..img_height {
        for x in 0..img_width {
            if mask.get(x, y) {
                min_x = Some(min_x.map_or(x, |v: u32| v.min(x)));
                max_x = Some(max_x.map_or(x, |v: u32| v.max(x)));
                min_y = Some(min_y.map_or(y, |v: u32| v.min(y)));
                max_y = Some(max_y.map_or(y, |v: u32| v.max(y)));
            }
        }
    }

    let (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) = (min_x, max_x, min_y, max_y)
    else {
        // Nothing to crop: keep the whole page.
        return *page_rect;
    };

    let margin_x = img_width as f64 * margin_fraction;
    let margin_y = img_height as f64 * margin_fraction;

    let x0_img = (min_x as f64 - margin_x).max(0.0);
    let y0_img = (min_y as f64 - margin_y).max(0.0);
    let x1_img = (max_x as f64 + margin_x).min(img_width as f64);
    let y1_img = (max_y as f64 + margin_y).min(img_height as f64);

    let zoom = dpi as f64 / POINTS_PER_INCH;
    CropBox::new(x0_img / zoom, y0_img / zoom, x1_img / zoom, y1_img / zoom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mask_fails_open_to_page_rect() {
        let mask = BinaryMask::new(100, 100);
        let page = CropBox::new(0.0, 0.0, 612.0, 792.0);
        let bounds = extract_bounds(&mask, 150, 0.02, &page);
        assert_eq!(bounds, page);
    }

    #[test]
    fn test_bounds_without_margin() {
        // Content from (30,40) to (69,89) at 144 DPI => zoom 2.0.
        let mut mask = BinaryMask::new(200, 200);
        for y in 40..90 {
            for x in 30..70 {
                mask.set(x, y, true);
            }
        }
        let page = CropBox::new(0.0, 0.0, 100.0, 100.0);
        let bounds = extract_bounds(&mask, 144, 0.0, &page);
        assert!((bounds.x0 - 15.0).abs() < 1e-9);
        assert!((bounds.y0 - 20.0).abs() < 1e-9);
        assert!((bounds.x1 - 34.5).abs() < 1e-9);
        assert!((bounds.y1 - 44.5).abs() < 1e-9);
    }

    #[test]
    fn test_margin_expansion_and_clamp() {
        // Single pixel near the corner; a 10% margin clamps at the image
        // border on the low side.
        let mut mask = BinaryMask::new(100, 100);
        mask.set(5, 5, true);
        let page = CropBox::new(0.0, 0.0, 100.0, 100.0);
        let bounds = extract_bounds(&mask, 72, 0.1, &page);
        assert_eq!(bounds.x0, 0.0);
        assert_eq!(bounds.y0, 0.0);
        assert!((bounds.x1 - 15.0).abs() < 1e-9);
        assert!((bounds.y1 - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_margin_clamps_at_high_side() {
        let mut mask = BinaryMask::new(100, 100);
        mask.set(98, 98, true);
        let page = CropBox::new(0.0, 0.0, 100.0, 100.0);
        let bounds = extract_bounds(&mask, 72, 0.1, &page);
        assert_eq!(bounds.x1, 100.0);
        assert_eq!(bounds.y1, 100.0);
    }
}
