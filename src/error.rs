use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error.
    #[error("Book not found: {0}")]
    NotFound(String),

    /// Identifier that does not decode to a library path.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// No cover could be resolved or opened for a book.
    #[error("Cover image not found: {0}")]
    CoverUnavailable(String),

    /// Underlying file could not be opened for reading.
    #[error("Unable to open the requested book: {0}")]
    StorageUnavailable(String),

    /// Missing or wrong API token.
    #[error("Unauthorized: missing or invalid API token")]
    Unauthorized,

    /// Rejected request parameters.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            // Bad identifiers look exactly like missing files.
            AppError::NotFound(_)
            | AppError::InvalidIdentifier(_)
            | AppError::CoverUnavailable(_) => StatusCode::NOT_FOUND,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::InvalidIdentifier(_) | AppError::NotFound(_) => {
                tracing::debug!(error = %self, "Not found");
                "Book not found.".to_string()
            }
            AppError::CoverUnavailable(_) => {
                tracing::debug!(error = %self, "Cover not found");
                "Cover image not found.".to_string()
            }
            AppError::Unauthorized => {
                tracing::debug!("Rejected request without a valid API token");
                "Unauthorized.".to_string()
            }
            _ => {
                tracing::error!(error = %self, "Request error");
                self.to_string()
            }
        };

        (status, message).into_response()
    }
}

/// Result type alias for the application.
pub type Result<T> = std::result::Result<T, AppError>;
