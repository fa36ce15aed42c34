//! Cover image lookup inside an EPUB package document.

use roxmltree::{Document, Node};

/// Resolve the archive path of the cover image declared by a package document.
///
/// Lookup order, first match wins:
/// 1. `<meta name="cover" content="ID">` in the metadata,
/// 2. a manifest item whose `properties` contain `cover-image`,
/// 3. the first manifest item with an `image/` media type.
///
/// An id found by (1) or (2) that does not resolve to a manifest href yields
/// `None`; the image fallback only applies when no id was declared at all.
/// `package_path` is the package document's own path in the archive, used to
/// turn the manifest-relative href into an archive-root-relative one.
pub fn resolve(doc: &Document<'_>, package_path: &str) -> Option<String> {
    let href = match cover_id_from_meta(doc).or_else(|| cover_id_from_manifest(doc)) {
        Some(id) => href_for_id(doc, id)?,
        None => first_image_href(doc)?,
    };

    Some(normalize_href(href, package_path))
}

fn manifest_items<'a, 'input>(
    doc: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.descendants().filter(|n| {
        n.is_element()
            && n.tag_name().name() == "item"
            && n.parent_element()
                .is_some_and(|p| p.tag_name().name() == "manifest")
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn cover_id_from_meta<'a>(doc: &'a Document<'_>) -> Option<&'a str> {
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "meta")
        .filter(|n| {
            n.attribute("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("cover"))
        })
        .find_map(|n| non_empty(n.attribute("content")))
}

fn cover_id_from_manifest<'a>(doc: &'a Document<'_>) -> Option<&'a str> {
    manifest_items(doc)
        .filter(|n| {
            n.attribute("properties")
                .is_some_and(|p| p.to_lowercase().contains("cover-image"))
        })
        .find_map(|n| non_empty(n.attribute("id")))
}

fn href_for_id<'a>(doc: &'a Document<'_>, id: &str) -> Option<&'a str> {
    let item = manifest_items(doc).find(|n| n.attribute("id") == Some(id))?;
    non_empty(item.attribute("href"))
}

fn first_image_href<'a>(doc: &'a Document<'_>) -> Option<&'a str> {
    manifest_items(doc)
        .filter(|n| {
            n.attribute("media-type")
                .is_some_and(|m| m.to_lowercase().contains("image/"))
        })
        .find_map(|n| non_empty(n.attribute("href")))
}

/// Prefix `href` with the package document's directory and clean it up.
pub fn normalize_href(href: &str, package_path: &str) -> String {
    let package_path = package_path.replace('\\', "/");
    let directory = package_path
        .rsplit_once('/')
        .map(|(dir, _)| dir.trim_matches('/'))
        .unwrap_or("");

    let href = href.replace('\\', "/");
    let joined = if directory.is_empty() || directory == "." {
        href
    } else {
        format!("{}/{}", directory, href.trim_start_matches('/'))
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}
