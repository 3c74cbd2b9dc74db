//! Page bitmap binarization.
//!
//! Converts a rendered grayscale page into a foreground mask, either with a
//! fixed threshold or with Otsu's between-class variance maximization.

use image::GrayImage;

/// Fallback threshold when the histogram is degenerate (single gray value).
const DEGENERATE_THRESHOLD: u8 = 128;

/// Binary foreground mask with the same dimensions as the rendered bitmap.
///
/// `true` marks a candidate content pixel (darker than the threshold).
/// Ephemeral: scoped to one page's detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl BinaryMask {
    /// Create an all-false mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        self.data[(y * self.width + x) as usize] = value;
    }

    /// Number of set pixels.
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }
}

/// Binarize a grayscale image with the given threshold.
///
/// A threshold of 0 selects Otsu auto-thresholding. The mask is true where
/// the pixel is strictly darker than the threshold.
pub fn binarize(gray: &GrayImage, threshold: u8) -> BinaryMask {
    let t = if threshold == 0 {
        otsu_threshold(gray)
    } else {
        threshold
    };
    threshold_mask(gray, t)
}

/// Mask of pixels strictly darker than `threshold`.
pub fn threshold_mask(gray: &GrayImage, threshold: u8) -> BinaryMask {
    let (width, height) = gray.dimensions();
    let mut mask = BinaryMask::new(width, height);
    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] < threshold {
            mask.set(x, y, true);
        }
    }
    mask
}

/// Otsu's global threshold over a 256-bin histogram.
///
/// Uses cumulative sums over one pass of the histogram; the selected value is
/// identical to the direct O(256²) between-class variance maximization, with
/// ties resolved toward the lowest candidate. Degenerate single-value images
/// yield 128.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut hist = [0u64; 256];
    for pixel in gray.pixels() {
        hist[pixel.0[0] as usize] += 1;
    }
    otsu_from_histogram(&hist)
}

/// Otsu threshold from a prebuilt histogram.
pub fn otsu_from_histogram(hist: &[u64; 256]) -> u8 {
    let total_pixels: u64 = hist.iter().sum();
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut sum_bg = 0.0f64;
    let mut weight_bg = 0u64;
    let mut max_variance = 0.0f64;
    let mut optimal = DEGENERATE_THRESHOLD;

    for t in 0..256usize {
        weight_bg += hist[t];
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total_pixels - weight_bg;
        if weight_fg == 0 {
            break;
        }

        sum_bg += t as f64 * hist[t] as f64;
        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_total - sum_bg) / weight_fg as f64;

        let variance = weight_bg as f64 * weight_fg as f64 * (mean_bg - mean_fg).powi(2);
        if variance > max_variance {
            max_variance = variance;
            optimal = t as u8;
        }
    }

    optimal
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Direct O(256²) reference implementation of the Otsu criterion.
    fn otsu_reference(hist: &[u64; 256]) -> u8 {
        let total: u64 = hist.iter().sum();
        let mut best = 128u8;
        let mut best_var = 0.0f64;
        for t in 0..256usize {
            let w_bg: u64 = hist[..=t].iter().sum();
            let w_fg = total - w_bg;
            if w_bg == 0 {
                continue;
            }
            if w_fg == 0 {
                break;
            }
            let sum_bg: f64 = hist[..=t]
                .iter()
                .enumerate()
                .map(|(v, &c)| v as f64 * c as f64)
                .sum();
            let sum_fg: f64 = hist[t + 1..]
                .iter()
                .enumerate()
                .map(|(v, &c)| (v + t + 1) as f64 * c as f64)
                .sum();
            let mean_bg = sum_bg / w_bg as f64;
            let mean_fg = sum_fg / w_fg as f64;
            let var = w_bg as f64 * w_fg as f64 * (mean_bg - mean_fg).powi(2);
            if var > best_var {
                best_var = var;
                best = t as u8;
            }
        }
        best
    }

    #[test]
    fn test_threshold_mask_strictly_darker() {
        let mut gray = GrayImage::from_pixel(4, 4, Luma([255]));
        gray.put_pixel(1, 1, Luma([99]));
        gray.put_pixel(2, 2, Luma([100]));

        let mask = threshold_mask(&gray, 100);
        assert!(mask.get(1, 1));
        // Equal to threshold is background.
        assert!(!mask.get(2, 2));
        assert_eq!(mask.count_set(), 1);
    }

    #[test]
    fn test_binarize_zero_selects_otsu() {
        let mut gray = GrayImage::from_pixel(20, 20, Luma([220]));
        for y in 5..15 {
            for x in 5..15 {
                gray.put_pixel(x, y, Luma([30]));
            }
        }
        let mask = binarize(&gray, 0);
        assert!(mask.get(10, 10));
        assert!(!mask.get(0, 0));
    }

    #[test]
    fn test_otsu_bimodal() {
        // Two well-separated classes; the split must land between them.
        let mut hist = [0u64; 256];
        hist[40] = 500;
        hist[200] = 500;
        let t = otsu_from_histogram(&hist);
        assert!(t >= 40 && t < 200, "threshold {} outside class gap", t);
        assert_eq!(t, otsu_reference(&hist));
    }

    #[test]
    fn test_otsu_matches_reference_on_synthetic_histograms() {
        let mut hist = [0u64; 256];
        for v in 0..256usize {
            hist[v] = ((v * 7919) % 97) as u64;
        }
        assert_eq!(otsu_from_histogram(&hist), otsu_reference(&hist));

        let mut skewed = [0u64; 256];
        for v in 0..64usize {
            skewed[v] = 1000 - (v as u64 * 10);
        }
        skewed[250] = 4000;
        assert_eq!(otsu_from_histogram(&skewed), otsu_reference(&skewed));
    }

    #[test]
    fn test_otsu_degenerate_single_value() {
        // All-one-value image: no valid split, deterministic fallback.
        let gray = GrayImage::from_pixel(10, 10, Luma([77]));
        assert_eq!(otsu_threshold(&gray), 128);

        let black = GrayImage::from_pixel(10, 10, Luma([0]));
        assert_eq!(otsu_threshold(&black), 128);
    }

    #[test]
    fn test_otsu_tie_takes_lowest() {
        // Symmetric histogram where several splits tie; the first (lowest)
        // candidate must win, matching the reference scan order.
        let mut hist = [0u64; 256];
        hist[0] = 100;
        hist[255] = 100;
        assert_eq!(otsu_from_histogram(&hist), otsu_reference(&hist));
    }

    #[test]
    fn test_mask_empty() {
        let mask = BinaryMask::new(5, 5);
        assert!(mask.is_empty());
        let gray = GrayImage::from_pixel(5, 5, Luma([255]));
        assert!(threshold_mask(&gray, 10).is_empty());
    }
}
