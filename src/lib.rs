//! docfields - OCR scanned identity documents and extract their fields.
//!
//! A document arrives as a PDF over a plain TCP connection, is rasterized and
//! OCRed on a bounded worker pool, normalized into logical lines and mined
//! for a fixed set of fields. The raw text goes back to the caller; the
//! fields and the text are stored in SQLite.

pub mod cli;
pub mod client;
pub mod config;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
