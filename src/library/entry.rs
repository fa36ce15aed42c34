//! Records produced by the catalog.

use crate::config::BookFormat;
use crate::formats::guess_mime_type;
use crate::library::id;
use crate::library::metadata::{self, Metadata};
use crate::library::stream::ByteStream;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One book file in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Opaque identifier, reversible to `path`.
    pub id: String,

    /// Path relative to the library root.
    pub path: String,

    /// Base name of the file.
    pub file_name: String,

    /// File extension, as written.
    pub extension: String,

    /// File size in bytes.
    pub file_size: u64,

    /// Last modified time.
    pub last_modified: DateTime<Utc>,

    /// Book title (falls back to the file name without extension).
    pub title: Option<String>,

    /// Author.
    pub author: Option<String>,

    /// Language code.
    pub language: Option<String>,

    /// Path of the cover image inside the archive.
    pub cover_path: Option<String>,

    /// MIME type of the book format, guessed from the extension otherwise.
    pub mime_type: String,
}

impl CatalogEntry {
    /// Assemble an entry from file stats and resolved metadata.
    pub fn new(
        path: &str,
        file_size: u64,
        last_modified: DateTime<Utc>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id::encode(path),
            path: path.to_string(),
            file_name: metadata::file_name(path).to_string(),
            extension: metadata::extension(path).to_string(),
            file_size,
            last_modified,
            title: metadata.title,
            author: metadata.author,
            language: metadata.language,
            cover_path: metadata.cover_path,
            mime_type: BookFormat::from_path(path)
                .map_or_else(|| guess_mime_type(path), |format| format.mime_type())
                .to_string(),
        }
    }

    /// Whether a cover path was found in the book's metadata.
    pub fn has_cover(&self) -> bool {
        self.cover_path.is_some()
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    /// Number of matching books before slicing.
    pub total: usize,
    /// Page size after clamping.
    pub per_page: usize,
    /// Page number after clamping (1-based).
    pub page: usize,
    /// Entries on this page.
    pub items: Vec<CatalogEntry>,
}

impl CatalogPage {
    /// Number of the last page (at least 1).
    pub fn last_page(&self) -> usize {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// 1-based position of the first item, if the page is not empty.
    pub fn from(&self) -> Option<usize> {
        (!self.items.is_empty()).then(|| (self.page - 1) * self.per_page + 1)
    }

    /// 1-based position of the last item, if the page is not empty.
    pub fn to(&self) -> Option<usize> {
        self.from().map(|from| from + self.items.len() - 1)
    }
}

/// Aggregate numbers over the whole library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Number of supported files.
    #[serde(rename = "total_books")]
    pub count: usize,
    /// Sum of their sizes.
    pub total_size_bytes: u64,
    /// Latest modification time, `None` for an empty library.
    #[serde(rename = "last_file_change")]
    pub most_recent_modification: Option<DateTime<Utc>>,
    /// When this snapshot was taken.
    pub generated_at: DateTime<Utc>,
}

/// Cover image bytes read out of a book archive.
pub struct CoverStream {
    /// Image content.
    pub stream: ByteStream,
    /// MIME type guessed from the cover path.
    pub mime: &'static str,
}
