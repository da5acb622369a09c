//! The `DagStore` trait: everything the engines need from the
//! content-addressable store.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ContentId, DirectoryEntry, EntryKind};

// =============================================================================
// Error Types
// =============================================================================

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The block was not found in the store.
    #[error("not found: {cid}")]
    NotFound { cid: ContentId },

    /// The CID resolved to a block that is not a directory.
    #[error("not a directory: {cid}")]
    NotDirectory { cid: ContentId },

    /// The store could not be reached or returned a transport-level error.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A block could not be decoded.
    #[error("malformed block {cid}: {message}")]
    Malformed { cid: ContentId, message: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// =============================================================================
// Listing Records
// =============================================================================

/// One child record as returned by a directory listing.
///
/// The kind may be absent: listings are requested without type resolution
/// (that is the whole point of the extension heuristic), and not every store
/// can report kinds for free. `None` means "ask [`DagStore::entry_kind`] if
/// you need to know".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChild {
    pub name: String,
    pub cid: ContentId,
    pub kind: Option<EntryKind>,
}

// =============================================================================
// DagStore Trait
// =============================================================================

/// Client interface to the content-addressable store.
///
/// All operations are asynchronous round trips. The store is treated as
/// append-only: nothing here mutates an existing block, `put_directory` only
/// ever creates new ones (deduplicated by content address on the store side).
#[async_trait]
pub trait DagStore: Send + Sync {
    /// List the direct children of a directory node.
    ///
    /// Returns [`StoreError::NotDirectory`] if the CID resolves to a file.
    async fn list_children(&self, cid: &ContentId) -> Result<Vec<RawChild>>;

    /// Report whether a block is a file or a directory.
    async fn entry_kind(&self, cid: &ContentId) -> Result<EntryKind>;

    /// Materialize a new directory node from the given entries.
    ///
    /// Entry order in the stored block must be deterministic for identical
    /// entry sets regardless of input order.
    async fn put_directory(&self, entries: &[DirectoryEntry]) -> Result<ContentId>;

    /// Fetch the contents of the file at `path` under the directory `root`.
    async fn fetch_file(&self, root: &ContentId, path: &str) -> Result<Vec<u8>>;

    /// Produce a portable archive holding `root`'s listing references plus
    /// exactly the blocks named in `included`.
    async fn export_archive(&self, root: &ContentId, included: &[ContentId]) -> Result<Vec<u8>>;
}
