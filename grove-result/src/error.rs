use std::io;

use thiserror::Error;

/// Unified error type for all grove operations.
///
/// Variants map onto the failure categories of the storage core: I/O,
/// caller misuse, damaged persistent state, address-space exhaustion,
/// missing catalog entries, CSV ingestion problems, and internal
/// invariant violations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file or disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid user input or API parameter.
    ///
    /// Covers malformed statements, bad CLI values, and storage calls
    /// with arguments the engine rejects (for example requesting a page
    /// range of zero pages).
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Persistent state failed validation while being read back.
    ///
    /// Raised when a data-file footer or metadata snapshot is missing a
    /// breadcrumb, carries an out-of-range size class, or does not match
    /// the recorded file length. The engine refuses to open the database
    /// in this case; the on-disk bytes are the source of truth and must
    /// not be silently repaired.
    #[error("corrupted metadata: {0}")]
    CorruptedMetadata(String),

    /// The page allocator would run past the addressable page space.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// A table, column, or stored chunk could not be located.
    #[error("{0} not found")]
    NotFound(String),

    /// CSV ingestion error.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// This should never surface during normal operation. The message
    /// names the violated invariant.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}
