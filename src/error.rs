//! Error types for btreedb
//!
//! Provides a unified error type for all operations. Outcomes that are
//! expected during normal use (duplicate key, table full) are not errors;
//! see [`crate::table::InsertOutcome`].

use thiserror::Error;

/// Result type alias using DbError
pub type Result<T> = std::result::Result<T, DbError>;

/// Unified error type for btreedb operations
#[derive(Debug, Error)]
pub enum DbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// On-disk bytes do not describe a valid table
    #[error("Database file corrupted: {0}")]
    Corrupted(String),

    /// Page cache ceiling reached
    #[error("Page {page} is beyond the page cache limit of {max_pages} pages")]
    PageOutOfBounds { page: u32, max_pages: u32 },

    /// A write was attempted through a read-only handle
    #[error("Read-only: {0}")]
    ReadOnly(String),

    // -------------------------------------------------------------------------
    // Tree Errors
    // -------------------------------------------------------------------------
    /// A structural invariant of the tree was violated at runtime
    #[error("Internal invariant violated: {0}")]
    Internal(String),

    // -------------------------------------------------------------------------
    // Row Errors
    // -------------------------------------------------------------------------
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
