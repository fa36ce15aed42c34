//! EPUB format handler.

use crate::error::Result;
use crate::formats::FormatHandler;
use crate::library::{Metadata, cover};
use roxmltree::{Document, Node, ParsingOptions};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Dublin Core elements namespace.
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// Location of the container document in every EPUB.
const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Handler for EPUB files.
pub struct EpubHandler;

impl EpubHandler {
    /// Read an archive entry as UTF-8 text, without a leading BOM.
    fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
        let mut content = String::new();
        archive.by_name(name)?.read_to_string(&mut content)?;

        Ok(match content.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => content,
        })
    }

    /// Parse an XML document. Legacy OEB and EPUB 2 files carry a DOCTYPE,
    /// so DTDs are accepted; external entities are never fetched.
    fn parse_xml(content: &str) -> Result<Document<'_>> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        Ok(Document::parse_with_options(content, options)?)
    }

    /// Find the package document path from container.xml.
    pub fn find_package_path<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<Option<String>> {
        let content = Self::read_entry(archive, CONTAINER_PATH)?;
        let doc = Self::parse_xml(&content)?;

        Ok(doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "rootfile")
            .and_then(|n| n.attribute("full-path"))
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from))
    }

    /// Text of the first Dublin Core element named `name`, trimmed.
    fn first_dc_value(doc: &Document<'_>, name: &str) -> Option<String> {
        let node = doc
            .descendants()
            .find(|n| n.is_element() && n.has_tag_name((DC_NS, name)))?;

        let value = Self::direct_text(node);
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn direct_text(node: Node<'_, '_>) -> String {
        node.children()
            .filter(|c| c.is_text())
            .filter_map(|c| c.text())
            .collect()
    }

    /// Parse a package document into metadata.
    pub fn parse_package(content: &str, package_path: &str) -> Result<Metadata> {
        let doc = Self::parse_xml(content)?;

        Ok(Metadata {
            title: Self::first_dc_value(&doc, "title"),
            author: Self::first_dc_value(&doc, "creator"),
            language: Self::first_dc_value(&doc, "language"),
            cover_path: cover::resolve(&doc, package_path),
        })
    }

    /// Read metadata from an already opened archive.
    pub fn read_metadata<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Metadata> {
        let Some(package_path) = Self::find_package_path(archive)? else {
            return Ok(Metadata::default());
        };

        let content = Self::read_entry(archive, &package_path)?;
        Self::parse_package(&content, &package_path)
    }

    /// Index of the archive entry at `inner_path`, if present.
    pub fn entry_index<R: Read + Seek>(
        archive: &ZipArchive<R>,
        inner_path: &str,
    ) -> Option<usize> {
        archive.index_for_name(inner_path.trim_start_matches('/'))
    }
}

impl FormatHandler for EpubHandler {
    fn extract_metadata(&self, path: &Path) -> Result<Metadata> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;
        Self::read_metadata(&mut archive)
    }

    fn page_count(&self, _path: &Path) -> Result<Option<u32>> {
        // EPUB doesn't have fixed pages
        Ok(None)
    }
}
