//! HTTP request handlers.

use crate::error::{AppError, Result};
use crate::library::entry::{CatalogEntry, CatalogPage, CatalogStats};
use crate::library::id;
use crate::server::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for listings.
const DEFAULT_PER_PAGE: i64 = 50;

/// Longest accepted search query, in characters.
const MAX_QUERY_LEN: usize = 255;

// ============================================================================
// WEB PAGES
// ============================================================================

/// Index page (simple HTML).
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    let book_count = state
        .with_catalog(|catalog| catalog.list(None).map(|files| files.len()))
        .await?;

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 600px; margin: 2rem auto; padding: 0 1rem; }}
        h1 {{ color: #333; }}
        a {{ color: #0066cc; }}
        .stats {{ background: #f5f5f5; padding: 1rem; border-radius: 8px; margin: 1rem 0; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <div class="stats">
        <p><strong>{book_count}</strong> books in library</p>
    </div>
    <h2>Links</h2>
    <ul>
        <li><a href="/api/books">Books (JSON)</a></li>
        <li><a href="/api/stats">Stats (JSON)</a></li>
    </ul>
</body>
</html>"#,
        title = html_escape(&state.config.server.title),
        book_count = book_count,
    );

    Ok(Html(html))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// BOOKS API
// ============================================================================

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<i64>,
    per_page: Option<i64>,
    q: Option<String>,
}

/// Book as returned by the API.
#[derive(Debug, Serialize)]
pub struct BookResource {
    id: String,
    file_name: String,
    path: String,
    extension: String,
    size_bytes: u64,
    last_modified: DateTime<Utc>,
    title: Option<String>,
    author: Option<String>,
    language: Option<String>,
    mime_type: String,
    download_url: String,
    cover_url: Option<String>,
}

impl BookResource {
    fn new(entry: CatalogEntry, base_url: &str) -> Self {
        let cover_url = entry
            .has_cover()
            .then(|| format!("{}/api/books/{}/cover", base_url, entry.id));

        Self {
            download_url: format!("{}/api/books/{}/download", base_url, entry.id),
            cover_url,
            id: entry.id,
            file_name: entry.file_name,
            path: entry.path,
            extension: entry.extension,
            size_bytes: entry.file_size,
            last_modified: entry.last_modified,
            title: entry.title,
            author: entry.author,
            language: entry.language,
            mime_type: entry.mime_type,
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    current_page: usize,
    per_page: usize,
    total: usize,
    last_page: usize,
    from: Option<usize>,
    to: Option<usize>,
}

/// Pagination links.
#[derive(Debug, Serialize)]
pub struct PageLinks {
    first: String,
    last: String,
    prev: Option<String>,
    next: Option<String>,
}

/// Paginated listing response.
#[derive(Debug, Serialize)]
pub struct BookListResponse {
    data: Vec<BookResource>,
    meta: PageMeta,
    links: PageLinks,
}

impl BookListResponse {
    fn new(page: CatalogPage, query: Option<&str>, base_url: &str) -> Self {
        let last_page = page.last_page();
        let link = |n: usize| page_link(base_url, n, page.per_page, query);

        let meta = PageMeta {
            current_page: page.page,
            per_page: page.per_page,
            total: page.total,
            last_page,
            from: page.from(),
            to: page.to(),
        };
        let links = PageLinks {
            first: link(1),
            last: link(last_page),
            prev: (page.page > 1).then(|| link(page.page - 1)),
            next: (page.page < last_page).then(|| link(page.page + 1)),
        };

        Self {
            data: page
                .items
                .into_iter()
                .map(|entry| BookResource::new(entry, base_url))
                .collect(),
            meta,
            links,
        }
    }
}

fn page_link(base_url: &str, page: usize, per_page: usize, query: Option<&str>) -> String {
    let mut link = format!("{}/api/books?page={}&per_page={}", base_url, page, per_page);
    if let Some(q) = query {
        link.push_str("&q=");
        link.push_str(&urlencoding::encode(q));
    }
    link
}

/// Paginated, searchable book listing.
pub async fn books_index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookListResponse>> {
    let query = params.q.filter(|q| !q.is_empty());
    if let Some(q) = &query
        && q.chars().count() > MAX_QUERY_LEN
    {
        return Err(AppError::BadRequest(format!(
            "q must not be longer than {} characters",
            MAX_QUERY_LEN
        )));
    }

    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE);
    let page = params.page.unwrap_or(1);

    let search = query.clone();
    let result = state
        .with_catalog(move |catalog| catalog.paginate(per_page, page, search.as_deref()))
        .await?;

    Ok(Json(BookListResponse::new(
        result,
        query.as_deref(),
        &state.base_url(),
    )))
}

/// Look up a book by identifier, as a 404 when it does not resolve.
async fn find_book(state: &AppState, id: String) -> Result<CatalogEntry> {
    if !id::is_well_formed(&id) {
        return Err(AppError::InvalidIdentifier(id));
    }

    let lookup = id.clone();
    state
        .with_catalog(move |catalog| catalog.find_by_id(&lookup))
        .await?
        .ok_or(AppError::NotFound(id))
}

/// Single book metadata.
pub async fn book_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookResource>> {
    let entry = find_book(&state, id).await?;
    Ok(Json(BookResource::new(entry, &state.base_url())))
}

/// Book download.
pub async fn book_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response<Body>> {
    let entry = find_book(&state, id).await?;
    let stream = state.catalog.stream(&entry.path).await?;

    let disposition = content_disposition("attachment", &entry.file_name);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, entry.mime_type.as_str())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, entry.file_size)
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Book cover image, read straight out of the archive.
pub async fn book_cover(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response<Body>> {
    let entry = find_book(&state, id).await?;

    let path = entry.path.clone();
    let cover = state
        .with_catalog(move |catalog| catalog.stream_cover(&path))
        .await?
        .ok_or_else(|| AppError::CoverUnavailable(entry.path.clone()))?;

    let disposition = content_disposition("inline", &format!("{}.cover", entry.file_name));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, cover.mime)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(cover.stream))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// `Content-Disposition` value with an ASCII `filename` fallback and the
/// exact name as an RFC 5987 `filename*` parameter.
fn content_disposition(disposition: &str, name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition,
        fallback,
        urlencoding::encode(name)
    )
}

// ============================================================================
// STATS API
// ============================================================================

/// API: Get library statistics.
pub async fn api_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>> {
    let stats = state.with_catalog(|catalog| catalog.stats()).await?;
    Ok(Json(stats))
}
