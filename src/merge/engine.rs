//! The merge engine: orchestrates listing, classification, resolution, and
//! materialization.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::classify::{classify, Classification};
use crate::model::{ContentId, DirectoryEntry, EntryKind, MergeRequest};
use crate::store::{DagStore, RawChild, StoreError};

use super::error::{MergeError, Result};
use super::resolve::{resolve_entries, ExcludedName};

/// Result of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// CID of the newly materialized directory node.
    pub root: ContentId,
    /// Names dropped because candidates disagreed.
    pub excluded: Vec<ExcludedName>,
}

/// Merge the children of the request's roots into a new directory node.
///
/// Root listings are fetched concurrently; entry ordering in the result is
/// deterministic (by name) regardless of completion order. Nothing is written
/// to the store until every entry is resolved, so a failure or cancellation
/// before the final `put_directory` leaves no trace.
///
/// `worker_limit` bounds concurrent kind-confirmation lookups.
pub async fn merge(
    store: &dyn DagStore,
    request: &MergeRequest,
    worker_limit: usize,
) -> Result<MergeOutcome> {
    if request.roots.is_empty() {
        return Err(MergeError::NoRoots);
    }
    info!(roots = request.roots.len(), "merging roots");

    // Fetch each root's listing concurrently; listings come back in root
    // order because try_join_all preserves input order.
    let listings: Vec<Vec<RawChild>> = try_join_all(request.roots.iter().map(|cid| async move {
        store.list_children(cid).await.map_err(|e| match e {
            StoreError::NotDirectory { .. } => MergeError::InvalidRoot { cid: cid.clone() },
            other => MergeError::UnresolvableRoot {
                cid: cid.clone(),
                source: other,
            },
        })
    }))
    .await?;

    // Settle kinds and group by name, walking roots in request order.
    let mut by_name: BTreeMap<String, Vec<DirectoryEntry>> = BTreeMap::new();
    for (root_idx, listing) in listings.into_iter().enumerate() {
        debug!(
            root = %request.roots[root_idx],
            children = listing.len(),
            "collected listing"
        );
        let entries =
            resolve_child_kinds(store, listing, request.force_check_directories, worker_limit)
                .await?;
        for entry in entries {
            by_name.entry(entry.name.clone()).or_default().push(entry);
        }
    }

    let (resolved, excluded) = resolve_entries(by_name);
    for exclusion in &excluded {
        warn!(
            name = %exclusion.name,
            candidates = exclusion.cids.len(),
            "conflicting entry excluded from merge"
        );
    }

    // Materialization is the single write, performed last.
    let root = store.put_directory(&resolved).await?;
    info!(root = %root, entries = resolved.len(), excluded = excluded.len(), "merge complete");
    Ok(MergeOutcome { root, excluded })
}

/// Settle the kind of every child in a listing.
///
/// Kinds reported by the listing are trusted. For the rest the extension
/// heuristic is consulted (unless `force_check` disables it), and whatever
/// stays unknown is confirmed against the store, at most `worker_limit`
/// lookups in flight. Output preserves listing order. Failures are
/// store-level; callers wrap them in their own error type.
pub async fn resolve_child_kinds(
    store: &dyn DagStore,
    listing: Vec<RawChild>,
    force_check: bool,
    worker_limit: usize,
) -> crate::store::Result<Vec<DirectoryEntry>> {
    let mut entries: Vec<DirectoryEntry> = Vec::with_capacity(listing.len());
    let mut pending: Vec<(usize, ContentId)> = Vec::new();

    for (idx, child) in listing.into_iter().enumerate() {
        // A kind from the listing wins even under force_check: it came from
        // the store, not from the heuristic.
        let kind = match child.kind {
            Some(kind) => Some(kind),
            None => match classify(&child.name, force_check) {
                Classification::KnownFile => Some(EntryKind::File),
                Classification::KnownDirectory => Some(EntryKind::Directory),
                Classification::Unknown => None,
            },
        };
        if kind.is_none() {
            pending.push((idx, child.cid.clone()));
        }
        entries.push(DirectoryEntry {
            name: child.name,
            cid: child.cid,
            // Placeholder until confirmed below.
            kind: kind.unwrap_or(EntryKind::File),
        });
    }

    if !pending.is_empty() {
        debug!(lookups = pending.len(), "confirming entry kinds");
        let confirmed: Vec<(usize, EntryKind)> = stream::iter(pending)
            .map(|(idx, cid)| async move {
                store.entry_kind(&cid).await.map(|kind| (idx, kind))
            })
            .buffer_unordered(worker_limit.max(1))
            .try_collect()
            .await?;
        for (idx, kind) in confirmed {
            entries[idx].kind = kind;
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDagStore;

    async fn root_with(store: &MemoryDagStore, files: &[(&str, &[u8])]) -> ContentId {
        let mut entries = Vec::new();
        for (name, data) in files {
            let cid = store.add_file(data);
            entries.push(DirectoryEntry::file(*name, cid));
        }
        store.put_directory(&entries).await.unwrap()
    }

    fn request(roots: Vec<ContentId>) -> MergeRequest {
        MergeRequest::new(roots, false)
    }

    #[tokio::test]
    async fn test_identity_merge_preserves_children() {
        let store = MemoryDagStore::new();
        let root = root_with(&store, &[("a.txt", b"a"), ("b.txt", b"b")]).await;

        let outcome = merge(&store, &request(vec![root.clone()]), 4).await.unwrap();
        assert!(outcome.excluded.is_empty());

        let original = store.list_children(&root).await.unwrap();
        let merged = store.list_children(&outcome.root).await.unwrap();
        assert_eq!(original, merged);
    }

    #[tokio::test]
    async fn test_merge_is_deterministic() {
        let store = MemoryDagStore::new();
        let a = root_with(&store, &[("x.txt", b"x")]).await;
        let b = root_with(&store, &[("y.txt", b"y")]).await;

        let roots = vec![a, b];
        let first = merge(&store, &request(roots.clone()), 4).await.unwrap();
        let second = merge(&store, &request(roots), 4).await.unwrap();
        assert_eq!(first.root, second.root);
    }

    #[tokio::test]
    async fn test_conflict_free_union() {
        let store = MemoryDagStore::new();
        let a = root_with(&store, &[("x.txt", b"x")]).await;
        let b = root_with(&store, &[("y.txt", b"y")]).await;

        let outcome = merge(&store, &request(vec![a, b]), 4).await.unwrap();
        assert!(outcome.excluded.is_empty());

        let children = store.list_children(&outcome.root).await.unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x.txt", "y.txt"]);
    }

    #[tokio::test]
    async fn test_conflicting_name_is_excluded() {
        let store = MemoryDagStore::new();
        let a = root_with(&store, &[("x.txt", b"version one"), ("keep.txt", b"k")]).await;
        let b = root_with(&store, &[("x.txt", b"version two")]).await;

        let outcome = merge(&store, &request(vec![a, b]), 4).await.unwrap();
        assert_eq!(outcome.excluded.len(), 1);
        assert_eq!(outcome.excluded[0].name, "x.txt");
        assert_eq!(outcome.excluded[0].cids.len(), 2);

        let children = store.list_children(&outcome.root).await.unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["keep.txt"]);
    }

    #[tokio::test]
    async fn test_identical_entries_collapse() {
        let store = MemoryDagStore::new();
        let shared = store.add_file(b"shared contents");
        let a = store
            .put_directory(&[DirectoryEntry::file("x.txt", shared.clone())])
            .await
            .unwrap();
        let b = store
            .put_directory(&[DirectoryEntry::file("x.txt", shared.clone())])
            .await
            .unwrap();

        let outcome = merge(&store, &request(vec![a, b]), 4).await.unwrap();
        assert!(outcome.excluded.is_empty());

        let children = store.list_children(&outcome.root).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].cid, shared);
    }

    #[tokio::test]
    async fn test_heuristic_equivalence_for_known_extensions() {
        let store = MemoryDagStore::new();
        let a = root_with(&store, &[("one.txt", b"1"), ("two.pdf", b"2")]).await;
        let b = root_with(&store, &[("three.xml", b"3")]).await;
        let roots = vec![a, b];

        let fast = merge(&store, &MergeRequest::new(roots.clone(), false), 4)
            .await
            .unwrap();
        let exact = merge(&store, &MergeRequest::new(roots, true), 4)
            .await
            .unwrap();
        assert_eq!(fast.root, exact.root);
    }

    #[tokio::test]
    async fn test_unknown_kinds_are_confirmed_against_store() {
        let store = MemoryDagStore::new();
        let inner_file = store.add_file(b"inner");
        let subdir = store
            .put_directory(&[DirectoryEntry::file("inner.txt", inner_file)])
            .await
            .unwrap();
        let plain = store.add_file(b"no extension");
        let root = store
            .put_directory(&[
                DirectoryEntry::directory("data", subdir.clone()),
                DirectoryEntry::file("README", plain.clone()),
            ])
            .await
            .unwrap();

        let outcome = merge(&store, &request(vec![root]), 4).await.unwrap();
        let merged = store.list_children(&outcome.root).await.unwrap();

        // Kinds survive the round trip through confirmation.
        assert_eq!(store.entry_kind(&subdir).await.unwrap(), EntryKind::Directory);
        assert_eq!(store.entry_kind(&plain).await.unwrap(), EntryKind::File);
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn test_file_root_is_invalid() {
        let store = MemoryDagStore::new();
        let file_cid = store.add_file(b"just a file");
        let result = merge(&store, &request(vec![file_cid]), 4).await;
        assert!(matches!(result, Err(MergeError::InvalidRoot { .. })));
    }

    #[tokio::test]
    async fn test_missing_root_is_unresolvable() {
        let store = MemoryDagStore::new();
        let result = merge(&store, &request(vec!["absent".to_string()]), 4).await;
        assert!(matches!(result, Err(MergeError::UnresolvableRoot { .. })));
    }

    #[tokio::test]
    async fn test_failed_kind_confirmation_is_a_store_error() {
        let store = MemoryDagStore::new();
        let root = store
            .put_directory(&[DirectoryEntry::file("README", "dangling".to_string())])
            .await
            .unwrap();

        let result = merge(&store, &request(vec![root]), 4).await;
        assert!(matches!(result, Err(MergeError::Store(_))));
    }

    #[tokio::test]
    async fn test_empty_request_is_rejected() {
        let store = MemoryDagStore::new();
        let result = merge(&store, &request(vec![]), 4).await;
        assert!(matches!(result, Err(MergeError::NoRoots)));
    }
}
