//! Bulk import of PDF/EPUB files into the library.
//!
//! Files found under a source directory are either copied into the library
//! storage or registered at their original location, and recorded in the
//! `books` table. That table is independent from the filesystem catalog.

use crate::config::BookFormat;
use crate::db::{BookRecord, Database, now_timestamp};
use crate::error::{AppError, Result};
use crate::formats;
use crate::library::Storage;
use chrono::Utc;
use rayon::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Files imported.
    pub imported: usize,
    /// Files skipped (unreadable, failed copy, already registered).
    pub skipped: usize,
}

/// What happened to one file.
enum Outcome {
    Imported(i64),
    Skipped,
}

/// Imports files into a storage and records them in the database.
pub struct Importer {
    storage: Arc<dyn Storage>,
    db: Database,
    workers: usize,
}

impl Importer {
    /// Create an importer.
    pub fn new(storage: Arc<dyn Storage>, db: Database, workers: usize) -> Self {
        Self {
            storage,
            db,
            workers: workers.max(1),
        }
    }

    /// Import every PDF/EPUB found under `source`.
    ///
    /// With `copy`, files are copied into the storage; otherwise the original
    /// absolute path is registered.
    pub fn run(&self, source: &Path, copy: bool) -> Result<ImportReport> {
        let source = source.canonicalize().unwrap_or_else(|_| source.to_path_buf());
        if !source.is_dir() {
            return Err(AppError::NotFound(format!(
                "Path not found or not a directory: {}",
                source.display()
            )));
        }

        let files: Vec<(PathBuf, BookFormat)> = walkdir::WalkDir::new(&source)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let format = e
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .and_then(BookFormat::from_extension)?;
                Some((e.into_path(), format))
            })
            .collect();

        tracing::info!(
            source = %source.display(),
            files = files.len(),
            copy,
            workers = self.workers,
            "Importing files"
        );

        let imported = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build import pool: {}", e)))?;

        pool.install(|| {
            files.par_iter().for_each(|(path, format)| {
                match self.import_file(path, *format, copy) {
                    Ok(Outcome::Imported(id)) => {
                        imported.fetch_add(1, Ordering::Relaxed);
                        tracing::info!(path = %path.display(), id, "Imported");
                    }
                    Ok(Outcome::Skipped) => {
                        skipped.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        skipped.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(path = %path.display(), error = %e, "Import failed");
                    }
                }
            });
        });

        Ok(ImportReport {
            imported: imported.into_inner(),
            skipped: skipped.into_inner(),
        })
    }

    fn import_file(&self, path: &Path, format: BookFormat, copy: bool) -> Result<Outcome> {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %path.display(), "Skipping file with non UTF-8 name");
            return Ok(Outcome::Skipped);
        };

        let size = std::fs::metadata(path)?.len() as i64;
        if self.db.find_book(filename, size)?.is_some() {
            tracing::info!(filename, "Skipping (already registered)");
            return Ok(Outcome::Skipped);
        }

        let (stored_path, url) = if copy {
            let target = storage_path(filename);
            let mut source = File::open(path)?;
            self.storage.put(&target, &mut source)?;
            let url = self.storage.public_url(&target);
            (target, url)
        } else {
            (path.to_string_lossy().to_string(), None)
        };

        let pages = match formats::get_handler(format).page_count(path) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No page count");
                None
            }
        };

        let now = now_timestamp();
        let record = BookRecord {
            id: 0, // Auto-increment
            title: clean_title(filename),
            filename: filename.to_string(),
            path: stored_path,
            url,
            mime_type: Some(format.mime_type().to_string()),
            size: Some(size),
            pages: pages.map(i64::from),
            author: None,
            description: None,
            created_at: now,
            updated_at: now,
        };

        Ok(match self.db.insert_book_if_absent(&record)? {
            Some(id) => Outcome::Imported(id),
            None => {
                tracing::info!(filename, "Skipping (already registered)");
                Outcome::Skipped
            }
        })
    }
}

/// Destination of a copied file: `books/<date>/<random>_<file name>`.
fn storage_path(filename: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "books/{}/{}_{}",
        Utc::now().format("%Y%m%d"),
        &token[..8],
        filename
    )
}

/// Title from a file name: extension dropped, runs of `_`/`-` turned into
/// one space.
pub fn clean_title(filename: &str) -> String {
    let stem = crate::library::metadata::file_stem(filename);

    let mut title = String::with_capacity(stem.len());
    let mut in_separator = false;
    for c in stem.chars() {
        if c == '_' || c == '-' {
            if !in_separator {
                title.push(' ');
            }
            in_separator = true;
        } else {
            title.push(c);
            in_separator = false;
        }
    }

    title.trim().to_string()
}
