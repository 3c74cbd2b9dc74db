//! Connected-component content filtering.
//!
//! Labels 8-connected regions of a binary page mask and keeps only the
//! components that look like genuine text or content, rejecting binding
//! shadows along the image edges, sub-pixel noise, oversized background
//! artifacts and thin rule lines. Survivors are unioned and dilated so
//! nearby glyph strokes merge into contiguous text blocks.

use std::collections::VecDeque;

use super::binarize::BinaryMask;

/// Reference DPI the character-size parameters are expressed at.
const REFERENCE_DPI: f64 = 150.0;

/// Edge margin, in pixels at the reference DPI, within which a component
/// counts as touching the image border.
const EDGE_MARGIN_AT_REFERENCE: f64 = 5.0;

/// Fraction of the image dimension above which an edge-touching component is
/// treated as a binding shadow.
const SHADOW_DIMENSION_RATIO: f64 = 0.3;

/// Components more elongated than this ratio are rejected as rule lines.
const MAX_ASPECT_RATIO: f64 = 30.0;

/// Dilation passes applied to the surviving-component mask.
const DILATE_ITERATIONS: u32 = 2;

/// Parameters for the component filter.
///
/// Character sizes are in pixels at 150 DPI and are rescaled to the working
/// resolution by `dpi / 150`.
#[derive(Debug, Clone)]
pub struct ComponentFilterOptions {
    /// DPI the mask was rendered at.
    pub dpi: u32,
    /// Minimum character size in pixels (at 150 DPI).
    pub min_char_size: u32,
    /// Maximum character size in pixels (at 150 DPI).
    pub max_char_size: u32,
    /// Minimum pixel count for a component to count as content.
    pub min_content_pixels: u32,
}

impl Default for ComponentFilterOptions {
    fn default() -> Self {
        Self {
            dpi: 150,
            min_char_size: 8,
            max_char_size: 200,
            min_content_pixels: 50,
        }
    }
}

/// A maximal 8-connected region of the mask. Bounding box edges are
/// inclusive pixel indices.
#[derive(Debug, Clone, Copy)]
pub struct Component {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl Component {
    fn new(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 1,
        }
    }

    fn expand(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Elongation ratio, always >= 1.
    pub fn aspect_ratio(&self) -> f64 {
        let longer = self.width().max(self.height()) as f64;
        let shorter = self.width().min(self.height()).max(1) as f64;
        longer / shorter
    }
}

/// Label all 8-connected components of the mask.
///
/// Returns the label map (0 = background, `i + 1` = `components[i]`) and the
/// component list.
pub fn label_components(mask: &BinaryMask) -> (Vec<u32>, Vec<Component>) {
    let width = mask.width();
    let height = mask.height();
    let mut labels = vec![0u32; (width as usize) * (height as usize)];
    let mut components = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            if labels[idx] == 0 && mask.get(x, y) {
                let label = components.len() as u32 + 1;
                let component = flood_fill(mask, x, y, label, &mut labels);
                components.push(component);
            }
        }
    }

    (labels, components)
}

/// Flood-fill one component starting at (start_x, start_y).
fn flood_fill(
    mask: &BinaryMask,
    start_x: u32,
    start_y: u32,
    label: u32,
    labels: &mut [u32],
) -> Component {
    const NEIGHBORS: [(i64, i64); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];

    let width = mask.width();
    let height = mask.height();
    let mut component = Component::new(start_x, start_y);
    let mut queue = VecDeque::new();

    labels[(start_y * width + start_x) as usize] = label;
    queue.push_back((start_x, start_y));

    while let Some((x, y)) = queue.pop_front() {
        for (dx, dy) in &NEIGHBORS {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            let idx = (ny * width + nx) as usize;
            if labels[idx] == 0 && mask.get(nx, ny) {
                labels[idx] = label;
                component.expand(nx, ny);
                queue.push_back((nx, ny));
            }
        }
    }

    component
}

/// Decide whether a component survives the shadow, size and aspect filters.
fn is_content_component(
    component: &Component,
    img_width: u32,
    img_height: u32,
    options: &ComponentFilterOptions,
) -> bool {
    let dpi_scale = options.dpi as f64 / REFERENCE_DPI;
    let edge_margin = (EDGE_MARGIN_AT_REFERENCE * dpi_scale) as u32;

    let height = component.height();
    let width = component.width();

    // Exclusive end coordinates, matching the bounding-box slice convention.
    let x_end = component.max_x + 1;
    let y_end = component.max_y + 1;

    let touches_left = component.min_x <= edge_margin;
    let touches_right = x_end >= img_width.saturating_sub(edge_margin);
    let touches_top = component.min_y <= edge_margin;
    let touches_bottom = y_end >= img_height.saturating_sub(edge_margin);

    // Long components hugging an edge are binding shadows, not content.
    if (touches_left || touches_right) && height as f64 > img_height as f64 * SHADOW_DIMENSION_RATIO
    {
        return false;
    }
    if (touches_top || touches_bottom) && width as f64 > img_width as f64 * SHADOW_DIMENSION_RATIO {
        return false;
    }

    let min_size = (options.min_char_size as f64 * dpi_scale) as u32;
    let max_size = (options.max_char_size as f64 * dpi_scale) as u32;

    // Height bound relaxed 3x to tolerate vertical text columns.
    let valid_size = min_size <= height
        && height <= max_size * 3
        && min_size <= width
        && width <= max_size
        && component.pixel_count >= options.min_content_pixels;
    if !valid_size {
        return false;
    }

    component.aspect_ratio() < MAX_ASPECT_RATIO
}

/// Keep only components judged to be genuine content.
///
/// Zero components degrade gracefully to the unmodified input. This stage is
/// idempotent: surviving components are reproduced exactly, so re-filtering
/// the result with the same parameters is a no-op.
pub fn filter_components(mask: &BinaryMask, options: &ComponentFilterOptions) -> BinaryMask {
    let (labels, components) = label_components(mask);
    if components.is_empty() {
        return mask.clone();
    }

    let width = mask.width();
    let height = mask.height();
    let keep: Vec<bool> = components
        .iter()
        .map(|c| is_content_component(c, width, height, options))
        .collect();

    let mut out = BinaryMask::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let label = labels[(y * width + x) as usize];
            if label != 0 && keep[(label - 1) as usize] {
                out.set(x, y, true);
            }
        }
    }
    out
}

/// Morphological dilation with a full 3x3 structuring element.
pub fn dilate(mask: &BinaryMask, iterations: u32) -> BinaryMask {
    let width = mask.width();
    let height = mask.height();
    let mut current = mask.clone();

    for _ in 0..iterations {
        let mut next = BinaryMask::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if current.get(x, y) {
                    let x0 = x.saturating_sub(1);
                    let y0 = y.saturating_sub(1);
                    let x1 = (x + 1).min(width - 1);
                    let y1 = (y + 1).min(height - 1);
                    for ny in y0..=y1 {
                        for nx in x0..=x1 {
                            next.set(nx, ny, true);
                        }
                    }
                }
            }
        }
        current = next;
    }

    current
}

/// Full content refinement: component filtering followed by dilation so
/// nearby strokes merge into text blocks before bounds extraction.
///
/// A mask with zero components is returned unchanged (no dilation either).
pub fn refine_mask(mask: &BinaryMask, options: &ComponentFilterOptions) -> BinaryMask {
    let (labels, components) = label_components(mask);
    if components.is_empty() {
        return mask.clone();
    }

    let width = mask.width();
    let height = mask.height();
    let keep: Vec<bool> = components
        .iter()
        .map(|c| is_content_component(c, width, height, options))
        .collect();

    let mut filtered = BinaryMask::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let label = labels[(y * width + x) as usize];
            if label != 0 && keep[(label - 1) as usize] {
                filtered.set(x, y, true);
            }
        }
    }

    dilate(&filtered, DILATE_ITERATIONS)
}
