//! Client command: send documents to a running server.

use std::path::PathBuf;

use console::style;

use crate::client::{is_error_response, send_file};

/// Send each file over its own connection and print the server's response.
pub async fn cmd_send(addr: &str, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut failed = 0;

    for file in files {
        println!(
            "{} {} -> {}",
            style("→").cyan(),
            file.display(),
            addr
        );

        match send_file(addr, file).await {
            Ok(response) if is_error_response(&response) => {
                failed += 1;
                eprintln!("  {} {}", style("✗").red(), response);
            }
            Ok(response) => {
                println!("{}", response);
            }
            Err(e) => {
                failed += 1;
                eprintln!("  {} {}: {}", style("✗").red(), file.display(), e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} documents failed", failed, files.len());
    }
    Ok(())
}
