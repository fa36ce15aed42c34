//! Bibliographic metadata derived from book files.

use crate::config::BookFormat;
use crate::formats;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata recovered for one book. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Book title.
    pub title: Option<String>,
    /// First creator.
    pub author: Option<String>,
    /// Language code (e.g., "en", "fr").
    pub language: Option<String>,
    /// Path of the cover image inside the archive.
    pub cover_path: Option<String>,
}

impl Metadata {
    /// Metadata used when nothing can be read from the file: the title is
    /// the file name without its extension.
    pub fn from_file_name(path: &str) -> Self {
        Self {
            title: Some(file_stem(path).to_string()),
            ..Self::default()
        }
    }

    /// Overlay the present fields of `other` on top of `self`.
    ///
    /// Absent fields in `other` never clear a value already in `self`.
    pub fn merge(self, other: Metadata) -> Self {
        Self {
            title: other.title.or(self.title),
            author: other.author.or(self.author),
            language: other.language.or(self.language),
            cover_path: other.cover_path.or(self.cover_path),
        }
    }
}

/// Base name of a relative path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Base name without its last extension.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

/// Extension of a relative path, as written.
pub fn extension(path: &str) -> &str {
    file_name(path)
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("")
}

/// Source of metadata for a file on the local filesystem.
pub trait MetadataExtractor: Send + Sync {
    /// Extract metadata, or `None` when the file cannot be read as a book.
    ///
    /// Never fails: unreadable archives and malformed XML come back as `None`.
    fn extract(&self, path: &Path) -> Option<Metadata>;
}

/// Extractor dispatching on the file extension to a [`formats::FormatHandler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatExtractor;

impl MetadataExtractor for FormatExtractor {
    fn extract(&self, path: &Path) -> Option<Metadata> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(BookFormat::from_extension)?;

        match formats::get_handler(format).extract_metadata(path) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Failed to extract metadata");
                None
            }
        }
    }
}
