//! Common error types for Aerial

use thiserror::Error;

/// Common result type for Aerial operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Aerial crates
#[derive(Error, Debug)]
pub enum Error {
    /// Playlist download failed (network, HTTP status, or body stream)
    #[error("Download error: {0}")]
    Download(String),

    /// Playlist text is structurally invalid
    #[error("Parse error: {0}")]
    Parse(String),

    /// Credentials rejected or account endpoint unreachable
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Storage failure during the replace-all transaction; the rollback
    /// has already been issued by the time this surfaces
    #[error("Persist error: {0}")]
    Persist(String),

    /// Read query on a nonexistent row
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation error outside the persist path (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
