//! Error types for merge operations.

use thiserror::Error;

use crate::model::ContentId;
use crate::store::StoreError;

/// Error type for merge operations.
///
/// All variants are fatal for the enclosing merge: no partial result is ever
/// materialized.
#[derive(Debug, Error)]
pub enum MergeError {
    /// No roots were supplied.
    #[error("no roots provided")]
    NoRoots,

    /// A supplied root does not resolve to a directory.
    #[error("root {cid} is not a directory")]
    InvalidRoot { cid: ContentId },

    /// A supplied root could not be fetched from the store.
    #[error("root {cid} could not be resolved: {source}")]
    UnresolvableRoot { cid: ContentId, source: StoreError },

    /// A store-level failure outside root resolution (kind confirmation or
    /// materialization).
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;
