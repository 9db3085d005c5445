//! Tesseract OCR backend implementation.
//!
//! Rasterizes the PDF with `pdftoppm` and runs `tesseract` on every page
//! image. Both tools write to files in a scratch directory, so a cancelled
//! run only has to kill the child and drop the directory.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use super::backend::{CancelFlag, DocumentOcr, OcrError, OcrSettings};
use super::tools::{check_binary, run_cancellable};
use crate::models::RawPageText;

const PAGE_PREFIX: &str = "page";

/// Tesseract OCR backend.
pub struct TesseractBackend {
    settings: OcrSettings,
    poll_interval: Duration,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default settings.
    pub fn new() -> Self {
        Self::with_settings(OcrSettings::default())
    }

    /// Create a new Tesseract backend with custom settings.
    pub fn with_settings(settings: OcrSettings) -> Self {
        Self {
            settings,
            poll_interval: Duration::from_millis(50),
        }
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    fn pdftoppm_args(&self) -> Vec<String> {
        let mut args = vec![
            "-png".to_string(),
            "-r".to_string(),
            self.settings.dpi.to_string(),
        ];
        if self.settings.grayscale {
            args.push("-gray".to_string());
        }
        args
    }

    fn tesseract_args(&self) -> Vec<String> {
        let mut args = vec![
            "-l".to_string(),
            self.settings.language.clone(),
            "--oem".to_string(),
            self.settings.engine_mode.to_string(),
            "--psm".to_string(),
            self.settings.page_segmentation_mode.to_string(),
        ];
        if self.settings.preserve_interword_spaces {
            args.push("-c".to_string());
            args.push("preserve_interword_spaces=1".to_string());
        }
        args
    }

    /// Render every page of `pdf_path` into `work_dir`.
    fn rasterize(
        &self,
        pdf_path: &Path,
        work_dir: &Path,
        cancel: &CancelFlag,
    ) -> Result<Vec<PathBuf>, OcrError> {
        let mut cmd = Command::new("pdftoppm");
        cmd.args(self.pdftoppm_args())
            .arg(pdf_path)
            .arg(work_dir.join(PAGE_PREFIX));

        run_cancellable(
            &mut cmd,
            "pdftoppm",
            "install poppler-utils",
            &work_dir.join("pdftoppm.stderr"),
            cancel,
            self.poll_interval,
        )?;

        let images = list_page_images(work_dir)?;
        if images.is_empty() {
            return Err(OcrError::OcrFailed(
                "pdftoppm produced no page images".to_string(),
            ));
        }
        Ok(images)
    }

    /// Run Tesseract on one page image.
    fn recognize_page(
        &self,
        image: &Path,
        work_dir: &Path,
        page_index: usize,
        cancel: &CancelFlag,
    ) -> Result<String, OcrError> {
        let out_base = work_dir.join(format!("text-{}", page_index));
        let mut cmd = Command::new("tesseract");
        cmd.arg(image).arg(&out_base).args(self.tesseract_args());

        run_cancellable(
            &mut cmd,
            "tesseract",
            "install tesseract-ocr",
            &work_dir.join(format!("tesseract-{}.stderr", page_index)),
            cancel,
            self.poll_interval,
        )?;

        let text = std::fs::read(out_base.with_extension("txt"))?;
        Ok(String::from_utf8_lossy(&text).into_owned())
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentOcr for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract") && check_binary("pdftoppm")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else if !check_binary("pdftoppm") {
            "pdftoppm not installed. Install with: apt install poppler-utils".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn recognize(
        &self,
        document: &[u8],
        cancel: &CancelFlag,
    ) -> Result<Vec<RawPageText>, OcrError> {
        let start = Instant::now();
        let work_dir = TempDir::new()?;
        let pdf_path = work_dir.path().join("input.pdf");
        std::fs::write(&pdf_path, document)?;

        let images = self.rasterize(&pdf_path, work_dir.path(), cancel)?;
        tracing::debug!(
            "Rasterized {} pages at {} dpi in {:?}",
            images.len(),
            self.settings.dpi,
            start.elapsed()
        );

        let mut pages = Vec::with_capacity(images.len());
        for (page_index, image) in images.iter().enumerate() {
            cancel.check()?;
            let text = self.recognize_page(image, work_dir.path(), page_index, cancel)?;
            pages.push(RawPageText::new(page_index, text));
        }

        tracing::debug!(
            "Recognized {} pages in {:?}",
            pages.len(),
            start.elapsed()
        );
        Ok(pages)
    }
}

/// Page images written by pdftoppm, in page order.
///
/// pdftoppm zero-pads page numbers to a common width, so a lexical sort
/// of the file names is page order.
fn list_page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "png")
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(PAGE_PREFIX))
        })
        .collect();
    images.sort();
    Ok(images)
}
