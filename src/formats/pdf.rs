use crate::error::{AppError, Result};
use crate::formats::FormatHandler;
use crate::library::Metadata;
use lopdf::Document;
use std::path::Path;

/// Handler for PDF files.
///
/// PDFs carry no package document, so the catalog falls back to
/// filename-derived metadata for them.
pub struct PdfHandler;

impl FormatHandler for PdfHandler {
    fn extract_metadata(&self, _path: &Path) -> Result<Metadata> {
        Ok(Metadata::default())
    }

    fn page_count(&self, path: &Path) -> Result<Option<u32>> {
        let doc = Document::load(path).map_err(|e| AppError::Pdf(e.to_string()))?;
        Ok(Some(doc.get_pages().len() as u32))
    }
}
