//! The item extraction engine.
//!
//! For each `<identifier>_files.xml` child of a root, fetch and parse the
//! manifest, then synthesize a directory node whose entries reference the
//! corresponding pre-existing subtrees of that root. Items whose subtree is
//! absent are skipped and reported rather than aborting the extraction; a
//! missing item is a data-quality issue, not an ambiguity.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{ContentId, DirectoryEntry, EntryKind};
use crate::store::{DagStore, StoreError};

use super::manifest::{parse_files_manifest, ExtractionManifest, ManifestParseError};

// =============================================================================
// Error Types
// =============================================================================

/// Error type for extraction operations.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The supplied root does not resolve to a directory.
    #[error("root {cid} is not a directory")]
    InvalidRoot { cid: ContentId },

    /// The supplied root could not be fetched from the store.
    #[error("root {cid} could not be resolved: {source}")]
    UnresolvableRoot { cid: ContentId, source: StoreError },

    /// The root contains no files-listing manifests.
    #[error("no files manifests found under {cid}")]
    NoManifests { cid: ContentId },

    /// A malformed manifest document.
    #[error("manifest parse error: {0}")]
    Manifest(#[from] ManifestParseError),

    /// A store-level failure during materialization.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

// =============================================================================
// Outcome Types
// =============================================================================

/// One successfully synthesized item directory.
#[derive(Debug, Clone)]
pub struct ExtractedItem {
    /// The manifest's identifier (the `*_files.xml` prefix).
    pub identifier: String,
    /// CID of the synthesized directory node.
    pub root: ContentId,
    /// Manifest paths whose subtree was absent from the original root.
    pub missing: Vec<String>,
}

/// A manifest that could not be used: unpaired (no metadata companion) or
/// none of its listed items could be located. Non-fatal: other manifests
/// under the same root still extract.
#[derive(Debug, Clone)]
pub struct ManifestFailure {
    pub identifier: String,
    pub reason: String,
}

/// Result of extracting every manifest under a root.
#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    pub items: Vec<ExtractedItem>,
    pub failures: Vec<ManifestFailure>,
}

// =============================================================================
// Engine
// =============================================================================

/// Extract every complete files manifest found among `root`'s children.
///
/// A files listing is only processed when its `_meta.xml` companion is also
/// present; unpaired listings are recorded as failures. A manifest that
/// cannot be fetched or parsed is fatal for the whole call. A manifest whose
/// listed items cannot be located is not: it is recorded in the outcome and
/// the remaining manifests still extract.
pub async fn extract_items(store: &dyn DagStore, root: &ContentId) -> Result<ExtractOutcome> {
    let children = store.list_children(root).await.map_err(|e| match e {
        StoreError::NotDirectory { .. } => ExtractError::InvalidRoot { cid: root.clone() },
        other => ExtractError::UnresolvableRoot {
            cid: root.clone(),
            source: other,
        },
    })?;

    // Every lookup below is by child name; kinds are irrelevant here.
    let available: BTreeMap<String, ContentId> = children
        .into_iter()
        .map(|c| (c.name, c.cid))
        .collect();

    let candidates: Vec<String> = available
        .keys()
        .filter_map(|name| name.strip_suffix("_files.xml"))
        .map(str::to_string)
        .collect();
    if candidates.is_empty() {
        return Err(ExtractError::NoManifests { cid: root.clone() });
    }

    let mut items = Vec::new();
    let mut failures = Vec::new();

    // Only identifiers with the complete manifest pair are trustworthy; a
    // files listing without its metadata document means the item's upload
    // never finished.
    let mut identifiers = Vec::with_capacity(candidates.len());
    for identifier in candidates {
        if available.contains_key(&format!("{}_meta.xml", identifier)) {
            identifiers.push(identifier);
        } else {
            warn!(identifier = %identifier, "missing metadata document, skipping manifest");
            failures.push(ManifestFailure {
                identifier,
                reason: "missing companion metadata document".to_string(),
            });
        }
    }
    info!(root = %root, manifests = identifiers.len(), "extracting items");

    for identifier in identifiers {
        let manifest_name = format!("{}_files.xml", identifier);
        let content = store.fetch_file(root, &manifest_name).await?;
        let manifest = parse_files_manifest(&content)?;

        match synthesize_directory(store, &identifier, &manifest, &available).await? {
            Some(item) => items.push(item),
            None => failures.push(ManifestFailure {
                identifier,
                reason: "no listed item could be located under the root".to_string(),
            }),
        }
    }

    Ok(ExtractOutcome { items, failures })
}

/// Synthesize the directory node for one manifest.
///
/// Records with a path separator contribute their top-level segment once, as
/// a directory entry; separator-free records are linked directly as files.
/// Subtrees are referenced, never copied. Returns `None` when nothing could
/// be located (an empty node would be meaningless).
pub async fn synthesize_directory(
    store: &dyn DagStore,
    identifier: &str,
    manifest: &ExtractionManifest,
    available: &BTreeMap<String, ContentId>,
) -> Result<Option<ExtractedItem>> {
    let mut entries: Vec<DirectoryEntry> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut missing = Vec::new();

    for record in &manifest.files {
        let (entry_name, kind) = match record.name.split_once('/') {
            Some((segment, _)) if !segment.is_empty() => {
                (segment.to_string(), EntryKind::Directory)
            }
            _ => (record.name.clone(), EntryKind::File),
        };
        if seen.contains(&entry_name) {
            continue;
        }

        match available.get(&entry_name) {
            Some(cid) => {
                debug!(identifier = %identifier, name = %entry_name, cid = %cid, "linked item");
                seen.push(entry_name.clone());
                entries.push(DirectoryEntry {
                    name: entry_name,
                    cid: cid.clone(),
                    kind,
                });
            }
            None => {
                warn!(identifier = %identifier, path = %record.name, "item not found under root, skipping");
                missing.push(record.name.clone());
            }
        }
    }

    if entries.is_empty() {
        return Ok(None);
    }

    let root = store.put_directory(&entries).await?;
    info!(identifier = %identifier, root = %root, entries = entries.len(), "synthesized item directory");
    Ok(Some(ExtractedItem {
        identifier: identifier.to_string(),
        root,
        missing,
    }))
}
