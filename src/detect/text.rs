//! Text-layout content-bounds detection.
//!
//! For digitally-typeset pages the structured text layout gives exact
//! content bounds without rasterizing anything, so this path is preferred
//! whenever spans are available.

use serde::{Deserialize, Serialize};

use super::types::CropBox;

/// One text span from a page's structured layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    /// Span bounding rectangle in page points (top-left origin).
    pub rect: CropBox,
    /// Span text content.
    pub text: String,
}

impl TextSpan {
    pub fn new(rect: CropBox, text: impl Into<String>) -> Self {
        Self {
            rect,
            text: text.into(),
        }
    }
}

/// Outcome of the text-layout detection pass.
///
/// `NotFound` is the signal to fall back to image-based detection; it is not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextBounds {
    Found(CropBox),
    NotFound,
}

impl TextBounds {
    pub fn found(&self) -> Option<CropBox> {
        match self {
            TextBounds::Found(rect) => Some(*rect),
            TextBounds::NotFound => None,
        }
    }
}

/// Smallest rectangle enclosing all non-whitespace spans, expanded by
/// `margin_fraction` of the page dimensions and clamped to the page rect.
pub fn detect_text_bounds(
    spans: &[TextSpan],
    page_rect: &CropBox,
    margin_fraction: f64,
) -> TextBounds {
    let mut x0_min = page_rect.x1;
    let mut y0_min = page_rect.y1;
    let mut x1_max = page_rect.x0;
    let mut y1_max = page_rect.y0;
    let mut has_text = false;

    for span in spans {
        if span.text.trim().is_empty() {
            continue;
        }
        x0_min = x0_min.min(span.rect.x0);
        y0_min = y0_min.min(span.rect.y0);
        x1_max = x1_max.max(span.rect.x1);
        y1_max = y1_max.max(span.rect.y1);
        has_text = true;
    }

    if !has_text {
        return TextBounds::NotFound;
    }

    let margin_x = page_rect.width() * margin_fraction;
    let margin_y = page_rect.height() * margin_fraction;

    TextBounds::Found(CropBox::new(
        (x0_min - margin_x).max(page_rect.x0),
        (y0_min - margin_y).max(page_rect.y0),
        (x1_max + margin_x).min(page_rect.x1),
        (y1_max + margin_y).min(page_rect.y1),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(x0: f64, y0: f64, x1: f64, y1: f64, text: &str) -> TextSpan {
        TextSpan::new(CropBox::new(x0, y0, x1, y1), text)
    }

    #[test]
    fn test_no_spans_is_not_found() {
        let page = CropBox::new(0.0, 0.0, 612.0, 792.0);
        assert_eq!(detect_text_bounds(&[], &page, 0.01), TextBounds::NotFound);
    }

    #[test]
    fn test_whitespace_only_spans_are_not_found() {
        let page = CropBox::new(0.0, 0.0, 612.0, 792.0);
        let spans = vec![
            span(10.0, 10.0, 50.0, 20.0, "   "),
            span(10.0, 30.0, 50.0, 40.0, "\t\n"),
        ];
        assert_eq!(detect_text_bounds(&spans, &page, 0.01), TextBounds::NotFound);
    }

    #[test]
    fn test_result_encloses_every_span() {
        let page = CropBox::new(0.0, 0.0, 600.0, 800.0);
        let spans = vec![
            span(100.0, 100.0, 200.0, 120.0, "first line"),
            span(90.0, 140.0, 250.0, 160.0, "second"),
            span(120.0, 700.0, 300.0, 720.0, "footer"),
            span(0.0, 0.0, 600.0, 800.0, "  "), // whitespace, ignored
        ];
        let result = detect_text_bounds(&spans, &page, 0.01);
        let rect = result.found().expect("text should be found");

        for s in spans.iter().filter(|s| !s.text.trim().is_empty()) {
            assert!(rect.contains(&s.rect), "{:?} not inside {:?}", s.rect, rect);
        }
        assert!(page.contains(&rect));

        // 1% margin on a 600x800 page is 6 and 8 points.
        assert!((rect.x0 - 84.0).abs() < 1e-9);
        assert!((rect.y0 - 92.0).abs() < 1e-9);
        assert!((rect.x1 - 306.0).abs() < 1e-9);
        assert!((rect.y1 - 728.0).abs() < 1e-9);
    }

    #[test]
    fn test_margin_clamped_to_page() {
        let page = CropBox::new(0.0, 0.0, 600.0, 800.0);
        let spans = vec![span(2.0, 2.0, 598.0, 798.0, "edge to edge")];
        let rect = detect_text_bounds(&spans, &page, 0.05)
            .found()
            .expect("text should be found");
        assert_eq!(rect, page);
    }
}
