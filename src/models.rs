//! Document text models produced by the OCR adapter.

use std::fmt;

/// Marker placed between the OCR output of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n==End of OCR for page==\n\n";

/// The separator line as it appears once the text is split into lines.
pub const PAGE_SEPARATOR_LINE: &str = "==End of OCR for page==";

/// Raw OCR output for a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPageText {
    /// Zero-based page position within the document.
    pub page_index: usize,
    pub text: String,
}

impl RawPageText {
    pub fn new(page_index: usize, text: impl Into<String>) -> Self {
        Self {
            page_index,
            text: text.into(),
        }
    }
}

/// Full OCR text of a document, pages joined by [`PAGE_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentText {
    text: String,
    page_count: usize,
}

impl DocumentText {
    /// Assemble document text from per-page OCR results.
    ///
    /// Pages are ordered by `page_index` regardless of the input order.
    pub fn from_pages(mut pages: Vec<RawPageText>) -> Self {
        pages.sort_by_key(|p| p.page_index);
        let page_count = pages.len();
        let text = pages
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);
        Self { text, page_count }
    }

    /// Wrap text that was already extracted elsewhere (e.g. a text file).
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let page_count = text.matches(PAGE_SEPARATOR_LINE).count() + 1;
        Self { text, page_count }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for DocumentText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
