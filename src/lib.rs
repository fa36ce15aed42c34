//! ebook-catalog: a read-only HTTP catalog over a folder of EPUB and PDF files.
//!
//! Books are addressed by opaque identifiers derived from their path under
//! the library root. Metadata is read from EPUB package documents and
//! memoized per file version; downloads and cover images are streamed
//! straight from disk or out of the archive.
//!
//! # Features
//!
//! - Paginated, searchable JSON listing
//! - EPUB metadata and cover extraction
//! - Streaming downloads
//! - Optional shared-secret API token
//! - Bulk import of PDF/EPUB folders into the library

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration and CLI.
pub mod config;
/// Import records database.
pub mod db;
/// Error types.
pub mod error;
/// Book format handlers.
pub mod formats;
/// Bulk import.
pub mod import;
/// Catalog engine.
pub mod library;
/// HTTP server.
pub mod server;


pub use config::{Cli, Command, Config};
pub use db::Database;
pub use error::{AppError, Result};
pub use server::AppState;
