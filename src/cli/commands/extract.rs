//! Local extraction commands.

use std::path::Path;
use std::sync::Arc;

use console::style;

use super::helpers::{open_repository, print_json};
use crate::config::Settings;
use crate::extract::{extract_from_lines, normalize};
use crate::ocr::{DocumentOcr, TesseractBackend};
use crate::repository::RecordStore;
use crate::services::WorkerPool;

/// OCR a PDF with the local tools and print the extracted record.
pub async fn cmd_extract(settings: &Settings, file: &Path, save: bool) -> anyhow::Result<()> {
    let backend = TesseractBackend::with_settings(settings.ocr.clone());
    if !backend.is_available() {
        anyhow::bail!(backend.availability_hint());
    }

    let document = tokio::fs::read(file).await?;
    eprintln!(
        "{} OCR {} ({} bytes)",
        style("→").cyan(),
        file.display(),
        document.len()
    );

    let pool = WorkerPool::new(Arc::new(backend), 1, 0, settings.deadline_policy());
    let text = pool.submit(document).await?;
    eprintln!(
        "  {} Recognized {} pages",
        style("✓").green(),
        text.page_count()
    );

    let record = extract_from_lines(&normalize(text.as_str()), text.as_str());
    print_json(&record)?;

    if save {
        let repo = open_repository(settings).await?;
        repo.save(&record, text.as_str()).await?;
        eprintln!(
            "  {} Saved to {}",
            style("✓").green(),
            settings.database_url()
        );
    }

    Ok(())
}

/// Extract a record from a text file.
pub async fn cmd_parse(file: &Path, show_lines: bool) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file).await?;
    let lines = normalize(&text);

    if show_lines {
        eprintln!("{}", style("Normalized lines:").bold());
        for (i, line) in lines.iter().enumerate() {
            eprintln!("  {:>3} {}", style(i).dim(), line);
        }
    }

    print_json(&extract_from_lines(&lines, &text))
}
