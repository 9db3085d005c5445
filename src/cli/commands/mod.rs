//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod extract;
mod helpers;
mod init;
mod ocr;
mod records;
mod send;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, DEFAULT_BIND};

#[derive(Parser)]
#[command(name = "docfields")]
#[command(about = "OCR scanned identity documents and extract their fields")]
#[command(version)]
pub struct Cli {
    /// Config file path (TOML or JSON; overrides auto-discovery)
    #[arg(short, long, global = true, env = "DOCFIELDS_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory holding the default database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Database URL or path (overrides the data directory)
    #[arg(long, global = true, env = "DATABASE_URL")]
    database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the document server
    Serve {
        /// Address to listen on: "host:port", "host" or "port"
        #[arg(env = "DOCFIELDS_BIND")]
        bind: Option<String>,
        /// Number of OCR workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Send PDFs to a running server and print the responses
    Send {
        /// PDF files, one connection each
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Server address
        #[arg(short, long, default_value = DEFAULT_BIND)]
        addr: String,
    },

    /// OCR a PDF locally and print the extracted record
    Extract {
        /// PDF file
        file: PathBuf,
        /// Also store the record in the database
        #[arg(long)]
        save: bool,
    },

    /// Extract a record from already-OCRed text
    Parse {
        /// Text file
        file: PathBuf,
        /// Print the normalized lines as well
        #[arg(long)]
        lines: bool,
    },

    /// Initialize the data directory and database
    Init,

    /// Show the most recently stored records
    Records {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// Check if required OCR tools are installed
    OcrCheck,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref()).await?;
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }
    if let Some(database) = cli.database {
        settings.database_url = Some(database);
    }

    match cli.command {
        Commands::Serve { bind, workers } => {
            if let Some(workers) = workers {
                settings.workers = workers.max(1);
            }
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Send { files, addr } => send::cmd_send(&addr, &files).await,
        Commands::Extract { file, save } => extract::cmd_extract(&settings, &file, save).await,
        Commands::Parse { file, lines } => extract::cmd_parse(&file, lines).await,
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Records { limit } => records::cmd_records(&settings, limit).await,
        Commands::OcrCheck => ocr::cmd_ocr_check(&settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from([
            "docfields",
            "send",
            "a.pdf",
            "b.pdf",
            "--addr",
            "10.0.0.2:4000",
        ])
        .unwrap();
        match cli.command {
            Commands::Send { files, addr } => {
                assert_eq!(files.len(), 2);
                assert_eq!(addr, "10.0.0.2:4000");
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_send_requires_files() {
        assert!(Cli::try_parse_from(["docfields", "send"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["docfields", "records", "--limit", "3", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Records { limit: 3 }));
    }
}
