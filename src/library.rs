//! Catalog over the library root: identifiers, metadata and streaming.

pub mod cache;
pub mod catalog;
pub mod cover;
pub mod entry;
pub mod id;
pub mod metadata;
pub mod storage;
pub mod stream;

pub use cache::{Cache, MemoryCache, MetadataCache};
pub use catalog::Catalog;
pub use entry::{CatalogEntry, CatalogPage, CatalogStats, CoverStream};
pub use metadata::{FormatExtractor, Metadata, MetadataExtractor};
pub use storage::{LocalStorage, Storage};
pub use stream::ByteStream;
