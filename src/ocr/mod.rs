//! OCR adapter.
//!
//! Turns PDF bytes into per-page text using external tools:
//! - pdftoppm (Poppler) to rasterize pages
//! - Tesseract OCR to recognize each page image
//!
//! Backends implement [`DocumentOcr`] so the worker pool can run any of them
//! (tests use in-process fakes).

mod backend;
mod tesseract;
mod tools;

pub use backend::{CancelFlag, DocumentOcr, OcrError, OcrSettings};
pub use tesseract::TesseractBackend;
pub use tools::check_binary;
