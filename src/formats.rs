mod epub;
mod pdf;

pub use epub::EpubHandler;
pub use pdf::PdfHandler;

use crate::config::BookFormat;
use crate::error::Result;
use crate::library::Metadata;
use std::path::Path;

/// Trait for format-specific book handlers.
pub trait FormatHandler: Send + Sync {
    /// Extract metadata from a book file. Absent fields stay `None`.
    fn extract_metadata(&self, path: &Path) -> Result<Metadata>;

    /// Get the number of pages (if applicable).
    fn page_count(&self, path: &Path) -> Result<Option<u32>>;
}

/// Get the appropriate handler for a book format.
pub fn get_handler(format: BookFormat) -> Box<dyn FormatHandler> {
    match format {
        BookFormat::Epub => Box::new(EpubHandler),
        BookFormat::Pdf => Box::new(PdfHandler),
    }
}

/// Guess a MIME type from a file name's extension.
pub fn guess_mime_type(path: &str) -> &'static str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "epub" => "application/epub+zip",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "jpeg" | "jpg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
