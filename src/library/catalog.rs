//! Catalog engine: listing, lookup and streaming over a [`Storage`].

use crate::config::BookFormat;
use crate::error::{AppError, Result};
use crate::formats::{EpubHandler, guess_mime_type};
use crate::library::cache::MetadataCache;
use crate::library::entry::{CatalogEntry, CatalogPage, CatalogStats, CoverStream};
use crate::library::id;
use crate::library::metadata::file_name;
use crate::library::storage::Storage;
use crate::library::stream::{self, ByteStream};
use chrono::Utc;
use std::fs::File;
use std::io;
use std::sync::Arc;
use zip::ZipArchive;

/// Largest accepted page size.
pub const MAX_PER_PAGE: usize = 100;

/// Read-only catalog over the library root.
pub struct Catalog {
    storage: Arc<dyn Storage>,
    metadata: MetadataCache,
}

impl Catalog {
    /// Create a catalog.
    pub fn new(storage: Arc<dyn Storage>, metadata: MetadataCache) -> Self {
        Self { storage, metadata }
    }

    /// Supported files, optionally filtered by a case-insensitive substring
    /// of their file name, sorted by path.
    pub fn list(&self, query: Option<&str>) -> Result<Vec<String>> {
        let needle = query
            .map(str::to_lowercase)
            .filter(|q| !q.is_empty());

        let mut files: Vec<String> = self
            .storage
            .list_files()?
            .into_iter()
            .filter(|path| BookFormat::from_path(path).is_some())
            .filter(|path| match &needle {
                Some(needle) => file_name(path).to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();

        files.sort();
        Ok(files)
    }

    /// One page of the (filtered) listing.
    ///
    /// `per_page` is clamped to `1..=100` and `page` to at least 1.
    pub fn paginate(&self, per_page: i64, page: i64, query: Option<&str>) -> Result<CatalogPage> {
        let files = self.list(query)?;
        let total = files.len();

        let per_page = per_page.clamp(1, MAX_PER_PAGE as i64) as usize;
        let page = page.max(1) as usize;
        let offset = (page - 1).saturating_mul(per_page);

        let items = files
            .iter()
            .skip(offset)
            .take(per_page)
            .map(|path| self.entry(path))
            .collect::<Result<Vec<_>>>()?;

        Ok(CatalogPage {
            total,
            per_page,
            page,
            items,
        })
    }

    /// Full entry for an existing path.
    pub fn entry(&self, path: &str) -> Result<CatalogEntry> {
        let size = self.storage.size(path)?;
        let modified = self.storage.last_modified(path)?;
        let metadata = self.metadata.get_versioned(path, size, modified);

        Ok(CatalogEntry::new(path, size, modified, metadata))
    }

    /// Entry for an identifier. Malformed identifiers and missing files both
    /// come back as `None`.
    pub fn find_by_id(&self, id: &str) -> Result<Option<CatalogEntry>> {
        let path = match id::decode(id) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(id, error = %e, "Rejected identifier");
                return Ok(None);
            }
        };

        if !self.storage.exists(&path) {
            return Ok(None);
        }

        self.entry(&path).map(Some)
    }

    /// Stream the content of a file.
    pub async fn stream(&self, path: &str) -> Result<ByteStream> {
        let unavailable = || AppError::StorageUnavailable(path.to_string());

        let Some(absolute) = self.storage.absolute_path(path) else {
            tracing::warn!(path, "Book has no local file to stream");
            return Err(unavailable());
        };
        let file = tokio::fs::File::open(&absolute).await.map_err(|e| {
            tracing::warn!(path, error = %e, "Failed to open book for streaming");
            unavailable()
        })?;

        Ok(stream::from_async_reader(file))
    }

    /// Stream the cover image of a book, if it has one that can be opened.
    pub fn stream_cover(&self, path: &str) -> Result<Option<CoverStream>> {
        let metadata = self.metadata.get(path)?;
        let Some(cover_path) = metadata.cover_path else {
            return Ok(None);
        };
        let Some(absolute) = self.storage.absolute_path(path) else {
            return Ok(None);
        };

        let opened = File::open(&absolute)
            .map_err(AppError::from)
            .and_then(|file| ZipArchive::new(file).map_err(AppError::from));
        let mut archive = match opened {
            Ok(archive) => archive,
            Err(e) => {
                tracing::debug!(path, error = %e, "Failed to open archive for cover");
                return Ok(None);
            }
        };

        let Some(index) = EpubHandler::entry_index(&archive, &cover_path) else {
            tracing::debug!(path, cover = %cover_path, "Cover entry missing from archive");
            return Ok(None);
        };
        if let Err(e) = archive.by_index(index) {
            tracing::debug!(path, cover = %cover_path, error = %e, "Cover entry unreadable");
            return Ok(None);
        }

        let stream = stream::from_blocking_copy(move |writer| {
            let mut entry = archive.by_index(index).map_err(io::Error::other)?;
            io::copy(&mut entry, writer).map(|_| ())
        });

        Ok(Some(CoverStream {
            stream,
            mime: guess_mime_type(&cover_path),
        }))
    }

    /// Aggregate numbers over the unfiltered listing.
    pub fn stats(&self) -> Result<CatalogStats> {
        let files = self.list(None)?;

        let mut total_size_bytes = 0u64;
        let mut most_recent_modification = None;
        for path in &files {
            total_size_bytes += self.storage.size(path)?;
            let modified = self.storage.last_modified(path)?;
            most_recent_modification = most_recent_modification.max(Some(modified));
        }

        Ok(CatalogStats {
            count: files.len(),
            total_size_bytes,
            most_recent_modification,
            generated_at: Utc::now(),
        })
    }
}
