//! File storage behind the catalog.
//!
//! Paths handed to a [`Storage`] are always relative to its root and use `/`
//! as separator, whatever the host platform.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Storage backend the catalog reads from.
pub trait Storage: Send + Sync {
    /// All files under the root, as relative paths.
    fn list_files(&self) -> Result<Vec<String>>;

    /// File size in bytes.
    fn size(&self, path: &str) -> Result<u64>;

    /// Last modification time.
    fn last_modified(&self, path: &str) -> Result<DateTime<Utc>>;

    /// Whether a regular file exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Write `reader` to `path`, creating parent directories. Returns bytes written.
    fn put(&self, path: &str, reader: &mut dyn Read) -> Result<u64>;

    /// Location of `path` on the local filesystem, for backends that have one.
    fn absolute_path(&self, _path: &str) -> Option<PathBuf> {
        None
    }

    /// Public URL of `path`, when the backend knows how to build one.
    fn public_url(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Storage rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_url: Option<String>,
}

impl LocalStorage {
    /// Create a storage rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_url: None,
        }
    }

    /// Set the base URL files are publicly served from.
    pub fn with_public_url(mut self, base: Option<String>) -> Self {
        self.public_url = base.filter(|b| !b.is_empty());
        self
    }

    /// Join a relative path onto the root, refusing anything that could
    /// leave it (absolute paths, `..`, drive prefixes).
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let mut components = relative.components().peekable();
        components.peek()?;

        if components.all(|c| matches!(c, Component::Normal(_))) {
            Some(self.root.join(relative))
        } else {
            None
        }
    }

    fn resolve_or_not_found(&self, path: &str) -> Result<PathBuf> {
        self.resolve(path)
            .ok_or_else(|| AppError::NotFound(path.to_string()))
    }

    /// Relative `/`-separated form of a path under the root.
    fn relative_of(&self, absolute: &Path) -> Option<String> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        let parts = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join("/"))
    }
}

impl Storage for LocalStorage {
    fn list_files(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            tracing::warn!(root = %self.root.display(), "Library root is not a directory");
            return Ok(Vec::new());
        }

        let files = walkdir::WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| self.relative_of(e.path()))
            .collect();

        Ok(files)
    }

    fn size(&self, path: &str) -> Result<u64> {
        Ok(fs::metadata(self.resolve_or_not_found(path)?)?.len())
    }

    fn last_modified(&self, path: &str) -> Result<DateTime<Utc>> {
        let modified = fs::metadata(self.resolve_or_not_found(path)?)?.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.is_file())
    }

    fn put(&self, path: &str, reader: &mut dyn Read) -> Result<u64> {
        let target = self.resolve_or_not_found(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&target)?;
        Ok(io::copy(reader, &mut file)?)
    }

    fn absolute_path(&self, path: &str) -> Option<PathBuf> {
        self.resolve(path)
    }

    fn public_url(&self, path: &str) -> Option<String> {
        let base = self.public_url.as_deref()?;
        self.resolve(path)?;

        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        Some(format!("{}/{}", base.trim_end_matches('/'), encoded.join("/")))
    }
}
