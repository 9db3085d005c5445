//! OCR backend abstraction.
//!
//! A backend turns a whole document into ordered per-page text. Backends run
//! on blocking worker threads and are expected to poll the [`CancelFlag`]
//! between (and during) expensive steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RawPageText;

/// Errors from OCR backends.
///
/// Any failure covers the whole document; there are no partial results.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("OCR cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared flag used to ask a running backend to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), OcrError> {
        if self.is_cancelled() {
            Err(OcrError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Rendering and recognition parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Rasterization resolution in dots per inch.
    pub dpi: u32,
    /// Tesseract language (e.g. "eng").
    pub language: String,
    /// Tesseract `--oem` value.
    pub engine_mode: u8,
    /// Tesseract `--psm` value.
    pub page_segmentation_mode: u8,
    /// Keep runs of spaces between words, which the line rules rely on.
    pub preserve_interword_spaces: bool,
    /// Render pages in grayscale before recognition.
    pub grayscale: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            dpi: 200,
            language: "eng".to_string(),
            engine_mode: 3,
            page_segmentation_mode: 3,
            preserve_interword_spaces: true,
            grayscale: true,
        }
    }
}

/// Trait for document OCR backends.
pub trait DocumentOcr: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Recognize every page of `document`, in page order.
    fn recognize(&self, document: &[u8], cancel: &CancelFlag)
        -> Result<Vec<RawPageText>, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let worker_view = flag.clone();
        assert!(worker_view.check().is_ok());

        flag.cancel();
        assert!(worker_view.is_cancelled());
        assert!(matches!(worker_view.check(), Err(OcrError::Cancelled)));
    }

    #[test]
    fn test_default_settings() {
        let settings = OcrSettings::default();
        assert_eq!(settings.dpi, 200);
        assert_eq!(settings.page_segmentation_mode, 3);
        assert!(settings.preserve_interword_spaces);
    }

    #[test]
    fn test_partial_settings_from_toml() {
        let settings: OcrSettings = toml::from_str("dpi = 300\nlanguage = \"tur\"").unwrap();
        assert_eq!(settings.dpi, 300);
        assert_eq!(settings.language, "tur");
        assert_eq!(settings.engine_mode, 3);
    }
}
