//! Initialize command.

use console::style;

use super::helpers::open_repository;
use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let repo = open_repository(settings).await?;
    let count = repo.count().await?;

    println!(
        "{} Database ready at {}",
        style("✓").green(),
        settings.database_url()
    );
    println!("  {} records stored", count);
    Ok(())
}
