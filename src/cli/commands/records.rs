//! Stored record listing.

use console::style;

use super::helpers::{open_repository, print_json};
use crate::config::Settings;

/// Show the most recently stored records, newest first.
pub async fn cmd_records(settings: &Settings, limit: u32) -> anyhow::Result<()> {
    let repo = open_repository(settings).await?;
    let total = repo.count().await?;
    let records = repo.latest(limit).await?;

    if records.is_empty() {
        println!("{} No records stored yet", style("!").yellow());
        return Ok(());
    }

    for record in &records {
        println!(
            "{} #{} {} ({} fields, {} chars of text)",
            style("●").cyan(),
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.fields.len(),
            record.raw_text.chars().count()
        );
        print_json(&record.fields)?;
    }

    println!(
        "\n{} of {} records shown",
        records.len(),
        total
    );
    Ok(())
}
