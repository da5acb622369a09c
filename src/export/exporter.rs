//! Shallow export: package only the directory blocks a result introduced.
//!
//! Anything reachable from the prior roots already exists wherever the
//! archive will be imported, so the exporter walks the prior roots first to
//! build the known set, then walks the result and keeps exactly the
//! directory blocks outside that set. File content never ships.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;
use tracing::{debug, info};

use crate::merge::resolve_child_kinds;
use crate::model::{ContentId, EntryKind};
use crate::store::{DagStore, StoreError};

/// Error type for export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The result root does not resolve to a directory.
    #[error("export root {cid} is not a directory")]
    InvalidRoot { cid: ContentId },

    /// A store-level failure during traversal or packaging.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Export `root` as a portable archive containing only the directory blocks
/// not reachable from `prior_roots`.
///
/// Both walks are breadth-first over directory nodes only; file children are
/// recorded as references but never descended into or included. The included
/// set is sorted, so identical inputs yield identical archives.
///
/// `force_check` selects the exhaustive kind-check policy for both walks, so
/// a directory whose name looks like a file cannot be mistaken for a leaf
/// and silently dropped from the archive.
pub async fn export_shallow(
    store: &dyn DagStore,
    root: &ContentId,
    prior_roots: &[ContentId],
    force_check: bool,
    worker_limit: usize,
) -> Result<Vec<u8>> {
    let known = collect_directories(store, prior_roots, force_check, worker_limit).await?;
    debug!(known = known.len(), "collected prior directory blocks");

    // Walk the result, keeping directory CIDs absent from the known set. The
    // root itself always ships.
    let mut included: Vec<ContentId> = Vec::new();
    let mut seen: HashSet<ContentId> = HashSet::new();
    let mut queue: VecDeque<ContentId> = VecDeque::new();
    queue.push_back(root.clone());
    seen.insert(root.clone());

    while let Some(cid) = queue.pop_front() {
        let fresh = !known.contains(&cid);
        if fresh {
            included.push(cid.clone());
        }

        let listing = store.list_children(&cid).await.map_err(|e| match e {
            StoreError::NotDirectory { cid } if cid == *root => {
                ExportError::InvalidRoot { cid }
            }
            other => ExportError::Store(other),
        })?;
        let entries = resolve_child_kinds(store, listing, force_check, worker_limit).await?;
        for entry in entries {
            if entry.kind == EntryKind::Directory && seen.insert(entry.cid.clone()) {
                // Subtrees below a known directory are known by reachability.
                if !known.contains(&entry.cid) {
                    queue.push_back(entry.cid);
                }
            }
        }
    }

    included.sort();
    info!(root = %root, blocks = included.len(), "exporting shallow archive");
    Ok(store.export_archive(root, &included).await?)
}

/// Collect every directory CID reachable from the given roots.
///
/// Roots that fail to list are skipped rather than fatal: a prior root that
/// no longer resolves just means fewer blocks can be elided.
async fn collect_directories(
    store: &dyn DagStore,
    roots: &[ContentId],
    force_check: bool,
    worker_limit: usize,
) -> Result<HashSet<ContentId>> {
    let mut known: HashSet<ContentId> = HashSet::new();
    let mut queue: VecDeque<ContentId> = VecDeque::new();
    for root in roots {
        if known.insert(root.clone()) {
            queue.push_back(root.clone());
        }
    }

    while let Some(cid) = queue.pop_front() {
        let listing = match store.list_children(&cid).await {
            Ok(listing) => listing,
            Err(_) => continue,
        };
        let entries = resolve_child_kinds(store, listing, force_check, worker_limit).await?;
        for entry in entries {
            if entry.kind == EntryKind::Directory && known.insert(entry.cid.clone()) {
                queue.push_back(entry.cid);
            }
        }
    }

    Ok(known)
}
