//! PDF document I/O.
//!
//! [`reader`] opens a document with lopdf and exposes it as a
//! [`crate::analyzer::PageSource`], rasterizing pages through Poppler's
//! `pdftoppm` and reading the text layout through `pdftotext`. [`writer`]
//! applies crop boxes and device scaling back onto the same document and
//! saves the result.

pub mod reader;
pub mod writer;

pub use reader::PdfReader;
pub use writer::PdfWriter;

use std::path::PathBuf;
use thiserror::Error;

/// PDF document errors.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("page {page} is malformed: {reason}")]
    Page { page: usize, reason: String },

    #[error("failed to save {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PdfError>;
