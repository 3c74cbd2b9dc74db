//! Read-side PDF access.
//!
//! Page geometry comes from lopdf. Rasterization and text-layout extraction
//! go through the Poppler command line tools (`pdftoppm`, `pdftotext`): they
//! handle the full range of real-world PDFs far better than any in-process
//! renderer. A missing `pdftotext` downgrades text detection to the image
//! pipeline instead of failing.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::GrayImage;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use super::{PdfError, Result};
use crate::analyzer::{PageSource, SourceError};
use crate::detect::{CropBox, TextSpan};

/// A PDF document opened for analysis.
pub struct PdfReader {
    path: PathBuf,
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for PdfReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfReader")
            .field("path", &self.path)
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl PdfReader {
    /// Open a PDF file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PdfError::NotFound(path.to_path_buf()));
        }
        let doc = Document::load(path).map_err(|e| PdfError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // get_pages returns a BTreeMap keyed by 1-based page number, so the
        // values iterate in document order.
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();

        Ok(Self {
            path: path.to_path_buf(),
            doc,
            page_ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone the underlying document for the write side.
    pub fn clone_document(&self) -> Document {
        self.doc.clone()
    }

    /// MediaBox of a page in PDF coordinates (bottom-left origin).
    pub fn media_box(&self, index: usize) -> Result<CropBox> {
        let page_id = *self
            .page_ids
            .get(index)
            .ok_or_else(|| PdfError::Page {
                page: index,
                reason: format!("index out of range (0..{})", self.page_ids.len()),
            })?;
        media_box(&self.doc, page_id).map_err(|reason| PdfError::Page {
            page: index,
            reason,
        })
    }
}

impl PageSource for PdfReader {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_rect(&self, index: usize) -> std::result::Result<CropBox, SourceError> {
        let mb = self.media_box(index).map_err(|e| SourceError::Page {
            page: index,
            reason: e.to_string(),
        })?;
        Ok(CropBox::full_page(mb.width(), mb.height()))
    }

    fn render_grayscale(
        &self,
        index: usize,
        dpi: u32,
    ) -> std::result::Result<GrayImage, SourceError> {
        let pdftoppm = which::which("pdftoppm").map_err(|_| SourceError::Render {
            page: index,
            dpi,
            reason: "pdftoppm not found in PATH (install poppler-utils)".into(),
        })?;

        let dir = tempfile::tempdir().map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let prefix = dir.path().join("page");
        let page_number = (index + 1).to_string();

        let output = Command::new(pdftoppm)
            .arg("-png")
            .arg("-gray")
            .args(["-r", &dpi.to_string()])
            .args(["-f", &page_number])
            .args(["-l", &page_number])
            .arg(&self.path)
            .arg(&prefix)
            .output()
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::Render {
                page: index,
                dpi,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // pdftoppm pads the page number in the output name, so scan the
        // directory for the single file it produced.
        let rendered = std::fs::read_dir(dir.path())
            .map_err(|source| SourceError::Io {
                path: dir.path().to_path_buf(),
                source,
            })?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| p.extension().is_some_and(|ext| ext == "png"))
            .ok_or_else(|| SourceError::Render {
                page: index,
                dpi,
                reason: "pdftoppm produced no output image".into(),
            })?;

        let img = image::open(&rendered).map_err(|e| SourceError::Render {
            page: index,
            dpi,
            reason: e.to_string(),
        })?;
        Ok(img.to_luma8())
    }

    fn text_spans(&self, index: usize) -> std::result::Result<Vec<TextSpan>, SourceError> {
        let Ok(pdftotext) = which::which("pdftotext") else {
            debug!("pdftotext not found, skipping text-layout detection");
            return Ok(Vec::new());
        };

        let dir = tempfile::tempdir().map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let out_path = dir.path().join("layout.xml");
        let page_number = (index + 1).to_string();

        let output = Command::new(pdftotext)
            .arg("-bbox")
            .arg("-q")
            .args(["-f", &page_number])
            .args(["-l", &page_number])
            .arg(&self.path)
            .arg(&out_path)
            .output()
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        if !output.status.success() {
            // A page the tool cannot handle is not fatal; the image
            // pipeline takes over.
            debug!(
                page = index,
                "pdftotext failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(Vec::new());
        }

        let xml = std::fs::read_to_string(&out_path).map_err(|source| SourceError::Io {
            path: out_path.clone(),
            source,
        })?;
        Ok(parse_bbox_words(&xml))
    }
}

// ============================================================
// lopdf helpers
// ============================================================

/// Inherited-attribute lookup, walking /Parent links up the page tree.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> std::result::Result<Option<&'a Object>, String> {
    let mut current_id = page_id;
    loop {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| format!("failed to get page dictionary: {e}"))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }

        match dict.get(b"Parent") {
            Ok(parent) => {
                current_id = parent
                    .as_reference()
                    .map_err(|e| format!("invalid /Parent reference: {e}"))?;
            }
            Err(_) => return Ok(None),
        }
    }
}

/// MediaBox for a page, in PDF coordinates.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> std::result::Result<CropBox, String> {
    let obj = resolve_inherited(doc, page_id, b"MediaBox")?
        .ok_or_else(|| "MediaBox not found on page or ancestors".to_string())?;
    let obj = match obj {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| format!("failed to resolve MediaBox reference: {e}"))?,
        other => other,
    };
    let array = obj
        .as_array()
        .map_err(|e| format!("MediaBox is not an array: {e}"))?;
    rect_from_array(array)
}

pub(crate) fn rect_from_array(array: &[Object]) -> std::result::Result<CropBox, String> {
    if array.len() != 4 {
        return Err(format!("expected 4-element box array, got {}", array.len()));
    }
    Ok(CropBox::new(
        object_to_f64(&array[0])?,
        object_to_f64(&array[1])?,
        object_to_f64(&array[2])?,
        object_to_f64(&array[3])?,
    ))
}

pub(crate) fn object_to_f64(obj: &Object) -> std::result::Result<f64, String> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(f) => Ok(*f as f64),
        _ => Err(format!("expected number, got {obj:?}")),
    }
}

// ============================================================
// pdftotext -bbox parsing
// ============================================================

/// Parse the word boxes out of `pdftotext -bbox` output.
///
/// The output is XHTML with one element per word:
/// `<word xMin="72.0" yMin="74.2" xMax="132.5" yMax="86.2">Hello</word>`,
/// coordinates in points from the top-left page corner. A full XML parser
/// is unnecessary for this fixed shape.
fn parse_bbox_words(xml: &str) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find("<word ") {
        rest = &rest[start..];
        let Some(tag_end) = rest.find('>') else { break };
        let tag = &rest[..tag_end];

        let coords = (
            attr_value(tag, "xMin"),
            attr_value(tag, "yMin"),
            attr_value(tag, "xMax"),
            attr_value(tag, "yMax"),
        );

        let body = &rest[tag_end + 1..];
        let Some(close) = body.find("</word>") else { break };
        let text = unescape_entities(&body[..close]);

        if let (Some(x0), Some(y0), Some(x1), Some(y1)) = coords {
            spans.push(TextSpan::new(CropBox::new(x0, y0, x1, y1), text));
        }

        rest = &body[close + "</word>".len()..];
    }

    spans
}

fn attr_value(tag: &str, name: &str) -> Option<f64> {
    let needle = format!("{name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')? + start;
    tag[start..end].parse().ok()
}

fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
