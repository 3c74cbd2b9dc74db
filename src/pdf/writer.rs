//! Write-side PDF transformation.
//!
//! The writer mutates a loaded document in place: each page gets its
//! MediaBox and CropBox replaced by the crop region, and when the page is
//! scaled for a device the content stream is wrapped in a `q .. cm` / `Q`
//! pair that maps the crop region onto a page starting at the origin.

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::reader::media_box;
use super::{PdfError, Result};
use crate::detect::CropBox;
use crate::render::{DocumentSink, SinkError};

/// Scale factors closer to 1.0 than this leave the content stream alone.
const SCALE_EPSILON: f64 = 1e-6;

/// Applies crops to a document and saves it.
pub struct PdfWriter {
    doc: Document,
    output: PathBuf,
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for PdfWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfWriter")
            .field("output", &self.output)
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl PdfWriter {
    /// Wrap a loaded document for writing to `output`.
    pub fn new(doc: Document, output: &Path) -> Self {
        let page_ids = doc.get_pages().values().copied().collect();
        Self {
            doc,
            output: output.to_path_buf(),
            page_ids,
        }
    }

    /// Compress and save the transformed document.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.doc.compress();
        self.doc.save(&self.output).map_err(|e| PdfError::Save {
            path: self.output.clone(),
            reason: e.to_string(),
        })?;
        Ok(self.output)
    }

    fn apply_page(
        &mut self,
        index: usize,
        crop: &CropBox,
        scaled_size: (f64, f64),
    ) -> std::result::Result<(), String> {
        let page_id = *self
            .page_ids
            .get(index)
            .ok_or_else(|| format!("index out of range (0..{})", self.page_ids.len()))?;
        let mb = media_box(&self.doc, page_id)?;

        // Crop coordinates are top-left based; PDF boxes are bottom-up.
        let pdf_rect = CropBox::new(
            mb.x0 + crop.x0,
            mb.y1 - crop.y1,
            mb.x0 + crop.x1,
            mb.y1 - crop.y0,
        );

        let scale = if crop.width() > 0.0 {
            scaled_size.0 / crop.width()
        } else {
            1.0
        };

        if (scale - 1.0).abs() > SCALE_EPSILON {
            self.scale_page_content(page_id, &pdf_rect, scale)?;
            let scaled = CropBox::new(0.0, 0.0, scaled_size.0, scaled_size.1);
            set_page_boxes(&mut self.doc, page_id, &scaled)?;
        } else {
            set_page_boxes(&mut self.doc, page_id, &pdf_rect)?;
        }
        Ok(())
    }

    /// Wrap the page content so the crop region, scaled by `scale`, lands at
    /// the page origin.
    fn scale_page_content(
        &mut self,
        page_id: ObjectId,
        pdf_rect: &CropBox,
        scale: f64,
    ) -> std::result::Result<(), String> {
        let old_contents = {
            let dict = self
                .doc
                .get_object(page_id)
                .and_then(|o| o.as_dict())
                .map_err(|e| format!("failed to get page dictionary: {e}"))?;
            dict.get(b"Contents").ok().cloned()
        };

        let mut streams: Vec<Object> = Vec::new();

        let tx = -pdf_rect.x0 * scale;
        let ty = -pdf_rect.y0 * scale;
        let prefix = format!("q {scale} 0 0 {scale} {tx} {ty} cm\n");
        let prefix_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, prefix.into_bytes()));
        streams.push(prefix_id.into());

        match old_contents {
            Some(Object::Reference(id)) => streams.push(Object::Reference(id)),
            Some(Object::Array(refs)) => streams.extend(refs),
            Some(other) => return Err(format!("/Contents is not a reference or array: {other:?}")),
            None => {}
        }

        let suffix_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, b"\nQ".to_vec()));
        streams.push(suffix_id.into());

        let dict = self
            .doc
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| format!("failed to get page dictionary: {e}"))?;
        dict.set("Contents", Object::Array(streams));
        Ok(())
    }
}

fn set_page_boxes(
    doc: &mut Document,
    page_id: ObjectId,
    rect: &CropBox,
) -> std::result::Result<(), String> {
    let dict = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| format!("failed to get page dictionary: {e}"))?;
    dict.set("MediaBox", rect_to_object(rect));
    dict.set("CropBox", rect_to_object(rect));
    Ok(())
}

fn rect_to_object(rect: &CropBox) -> Object {
    Object::Array(vec![
        Object::Real(rect.x0 as f32),
        Object::Real(rect.y0 as f32),
        Object::Real(rect.x1 as f32),
        Object::Real(rect.y1 as f32),
    ])
}

impl DocumentSink for PdfWriter {
    fn push_page(
        &mut self,
        source_index: usize,
        crop: &CropBox,
        scaled_size: (f64, f64),
    ) -> std::result::Result<(), SinkError> {
        self.apply_page(source_index, crop, scaled_size)
            .map_err(|reason| SinkError::Page {
                page: source_index,
                reason,
            })
    }
}
