use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the admin surface.
///
/// Per-folder problems during a sync are not errors — they end up in the
/// sync report as skipped or failed entries and the run keeps going.
/// This enum covers the failures that abort a whole operation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The sync root (or a directory the store location needs) could not
    /// be listed. Subdirectory-level read failures are downgraded to
    /// report entries instead.
    #[error("cannot read directory {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The images column holds a JSON array of path strings; this fires
    /// when a stored value fails to decode (or a list fails to encode).
    #[error("images column codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// A `kind` column value outside dam/sire/puppy. The schema CHECK
    /// constraint should make this unreachable; it exists so a corrupted
    /// database surfaces as an error instead of a panic.
    #[error("invalid kind column value: {0:?}")]
    InvalidKind(String),

    /// Another sync run holds the reconciler guard.
    #[error("a sync is already in progress")]
    SyncInProgress,
}

pub type Result<T> = std::result::Result<T, CatalogError>;
