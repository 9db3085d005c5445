//! Text normalization: raw OCR text into logical lines.
//!
//! OCR frequently collapses several labelled fields onto one physical line
//! and wraps long values onto indented follow-up lines. Normalization first
//! breaks the text before every known label, then folds indented lines back
//! into the line they continue.

use std::fmt;

use super::labels::LABEL_ANCHOR;
use crate::models::PAGE_SEPARATOR_LINE;

/// One semantic statement after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine(String);

impl LogicalLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_page_break(&self) -> bool {
        self.0 == PAGE_SEPARATOR_LINE
    }

    /// Whether an indented physical line may be folded into this one.
    fn accepts_continuation(&self) -> bool {
        !self.is_blank() && !self.is_page_break()
    }

    fn append(&mut self, fragment: &str) {
        self.0.push(' ');
        self.0.push_str(fragment);
    }
}

impl fmt::Display for LogicalLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insert a line break in front of every label not already starting a line.
pub fn split_at_labels(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 32);
    let mut last = 0;
    for m in LABEL_ANCHOR.find_iter(raw) {
        out.push_str(&raw[last..m.start()]);
        if m.start() > 0 && !raw[..m.start()].ends_with('\n') {
            out.push('\n');
        }
        last = m.start();
    }
    out.push_str(&raw[last..]);
    out
}

/// Normalize raw document text into ordered logical lines.
pub fn normalize(raw: &str) -> Vec<LogicalLine> {
    let split = split_at_labels(raw);
    let mut lines: Vec<LogicalLine> = Vec::new();

    for physical in split.lines() {
        let content = physical.trim();
        let indented = physical.starts_with([' ', '\t']);

        if indented {
            if content.is_empty() {
                continue;
            }
            if let Some(last) = lines.last_mut().filter(|l| l.accepts_continuation()) {
                last.append(content);
                continue;
            }
        }
        lines.push(LogicalLine::new(content));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::labels::LABELS;
    use crate::models::{DocumentText, RawPageText};

    fn texts(lines: &[LogicalLine]) -> Vec<&str> {
        lines.iter().map(LogicalLine::as_str).collect()
    }

    #[test]
    fn test_continuation_merge() {
        let lines = normalize("Name: John\n   Smith");
        assert_eq!(texts(&lines), vec!["Name: John Smith"]);
    }

    #[test]
    fn test_tab_indent_is_continuation() {
        let lines = normalize("Address: 1 Main St\n\tSpringfield\nSex: F");
        assert_eq!(texts(&lines), vec!["Address: 1 Main St Springfield", "Sex: F"]);
    }

    #[test]
    fn test_collapsed_labels_are_split() {
        let lines = normalize("Family Name: DOE   Forenames: JOHN   Sex: M");
        assert_eq!(
            texts(&lines),
            vec!["Family Name: DOE", "Forenames: JOHN", "Sex: M"]
        );
    }

    #[test]
    fn test_every_label_starts_its_own_line() {
        for (label, _) in LABELS {
            let raw = format!("prefix text {}: value", label);
            let lines = normalize(&raw);
            let expected = format!("{}: value", label);
            assert!(
                lines.iter().any(|l| l.as_str() == expected),
                "label {:?} produced {:?}",
                label,
                lines
            );
        }
    }

    #[test]
    fn test_label_matching_ignores_case() {
        let lines = normalize("header FAMILY NAME: DOE");
        assert_eq!(texts(&lines), vec!["header", "FAMILY NAME: DOE"]);
    }

    #[test]
    fn test_indented_label_at_start_of_text() {
        let lines = normalize("   Sex: M\nNationality: TR");
        assert_eq!(texts(&lines), vec!["Sex: M", "Nationality: TR"]);
    }

    #[test]
    fn test_indented_label_mid_text_starts_new_line() {
        let lines = normalize("Remarks: none\n    Family Name: DOE");
        assert_eq!(texts(&lines), vec!["Remarks: none", "Family Name: DOE"]);
    }

    #[test]
    fn test_page_separator_is_never_merged() {
        let doc = DocumentText::from_pages(vec![
            RawPageText::new(0, "Remarks: first page"),
            RawPageText::new(1, "   continued text\nSex: M"),
        ]);
        let lines = normalize(doc.as_str());

        assert!(lines.iter().any(|l| l.is_page_break()));
        for line in &lines {
            if line.as_str().contains(PAGE_SEPARATOR_LINE) {
                assert!(line.is_page_break(), "separator merged into {:?}", line);
            }
        }
        assert!(texts(&lines).contains(&"Remarks: first page"));
        assert!(texts(&lines).contains(&"continued text"));
    }

    #[test]
    fn test_label_text_is_escaped() {
        // The parentheses in "forename(s)" must match literally.
        let lines = normalize("x forename(s): JANE");
        assert_eq!(texts(&lines), vec!["x", "forename(s): JANE"]);
    }
}
