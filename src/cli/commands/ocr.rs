//! OCR tool check.

use console::style;

use crate::config::Settings;
use crate::ocr::{check_binary, DocumentOcr, TesseractBackend};

/// Check if required OCR tools are installed.
pub fn cmd_ocr_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("OCR Tool Status").bold());
    println!("{}", "-".repeat(50));

    let mut all_found = true;
    for tool in ["pdftoppm", "tesseract"] {
        let status = if check_binary(tool) {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    let backend = TesseractBackend::with_settings(settings.ocr.clone());
    let ocr = backend.settings();
    println!("\n{}", style("Recognition settings:").cyan());
    println!("  {:<15} {}", "dpi", ocr.dpi);
    println!("  {:<15} {}", "language", ocr.language);
    println!(
        "  {:<15} {} / {}",
        "oem / psm", ocr.engine_mode, ocr.page_segmentation_mode
    );

    println!();
    if all_found {
        println!("{} All OCR tools are available", style("✓").green());
    } else {
        println!("{} {}", style("!").yellow(), backend.availability_hint());
    }
    Ok(())
}
