use crate::db::BookRecord;
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

const BOOK_COLUMNS: &str = "id, title, filename, path, url, mime_type, size, pages, author, \
                            description, created_at, updated_at";

/// Database wrapper for thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                filename TEXT NOT NULL,
                path TEXT NOT NULL,
                url TEXT,
                mime_type TEXT,
                size INTEGER,
                pages INTEGER,
                author TEXT,
                description TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);
            CREATE INDEX IF NOT EXISTS idx_books_filename ON books(filename);
            "#,
        )
        .map_err(|e| AppError::Database(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    // ========== BOOK OPERATIONS ==========

    /// Find a book by file name and size.
    pub fn find_book(&self, filename: &str, size: i64) -> Result<Option<BookRecord>> {
        let conn = self.conn.lock();
        Self::find_book_locked(&conn, filename, size)
    }

    fn find_book_locked(conn: &Connection, filename: &str, size: i64) -> Result<Option<BookRecord>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM books WHERE filename = ?1 AND size = ?2",
                BOOK_COLUMNS
            ),
            params![filename, size],
            Self::row_to_book,
        )
        .optional()
        .map_err(|e| AppError::Database(format!("Failed to get book: {}", e)))
    }

    /// Insert a book unless one with the same file name and size exists.
    ///
    /// Returns the new row ID, or `None` when the book was already registered.
    pub fn insert_book_if_absent(&self, book: &BookRecord) -> Result<Option<i64>> {
        let conn = self.conn.lock();

        if let Some(size) = book.size
            && Self::find_book_locked(&conn, &book.filename, size)?.is_some()
        {
            return Ok(None);
        }

        conn.execute(
            "INSERT INTO books
             (title, filename, path, url, mime_type, size, pages, author, description,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                book.title,
                book.filename,
                book.path,
                book.url,
                book.mime_type,
                book.size,
                book.pages,
                book.author,
                book.description,
                book.created_at,
                book.updated_at,
            ],
        )
        .map_err(|e| AppError::Database(format!("Failed to save book: {}", e)))?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// Get all books ordered by title.
    pub fn list_books(&self) -> Result<Vec<BookRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM books ORDER BY title", BOOK_COLUMNS))
            .map_err(|e| AppError::Database(format!("Failed to prepare query: {}", e)))?;

        let books = stmt
            .query_map([], Self::row_to_book)
            .map_err(|e| AppError::Database(format!("Failed to get books: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("Failed to collect books: {}", e)))?;

        Ok(books)
    }

    /// Number of registered books.
    pub fn count_books(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| AppError::Database(format!("Failed to count books: {}", e)))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to BookRecord.
    fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookRecord> {
        Ok(BookRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            filename: row.get(2)?,
            path: row.get(3)?,
            url: row.get(4)?,
            mime_type: row.get(5)?,
            size: row.get(6)?,
            pages: row.get(7)?,
            author: row.get(8)?,
            description: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}
