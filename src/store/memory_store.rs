//! An in-memory content-addressed store, intended primarily for testing.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::export::archive::{self, ArchiveRef};
use crate::model::{ContentId, DirectoryEntry, DirectoryNode, EntryKind};

use super::dag_store::{DagStore, RawChild, Result, StoreError};

struct Block {
    data: Vec<u8>,
    kind: EntryKind,
}

/// In-memory implementation of [`DagStore`].
///
/// CIDs are sha-256 hex digests of the block bytes; directory blocks are
/// canonical JSON [`DirectoryNode`] documents, so the store deduplicates
/// identical directories by construction.
pub struct MemoryDagStore {
    blocks: RwLock<HashMap<ContentId, Block>>,
}

impl MemoryDagStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Add a leaf file block and return its CID.
    pub fn add_file(&self, data: &[u8]) -> ContentId {
        let cid = content_id(data);
        self.blocks.write().unwrap().insert(
            cid.clone(),
            Block {
                data: data.to_vec(),
                kind: EntryKind::File,
            },
        );
        cid
    }

    /// Whether a block with this CID exists.
    pub fn contains(&self, cid: &str) -> bool {
        self.blocks.read().unwrap().contains_key(cid)
    }

    /// Number of stored blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.read().unwrap().len()
    }

    fn read_directory(&self, cid: &ContentId) -> Result<DirectoryNode> {
        let blocks = self.blocks.read().unwrap();
        let block = blocks.get(cid).ok_or_else(|| StoreError::NotFound {
            cid: cid.clone(),
        })?;
        if block.kind != EntryKind::Directory {
            return Err(StoreError::NotDirectory { cid: cid.clone() });
        }
        serde_json::from_slice(&block.data).map_err(|e| StoreError::Malformed {
            cid: cid.clone(),
            message: e.to_string(),
        })
    }
}

impl Default for MemoryDagStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DagStore for MemoryDagStore {
    async fn list_children(&self, cid: &ContentId) -> Result<Vec<RawChild>> {
        let node = self.read_directory(cid)?;
        // Kinds are withheld to mirror a listing requested without type
        // resolution; callers go through the classifier or entry_kind.
        Ok(node
            .entries
            .into_iter()
            .map(|e| RawChild {
                name: e.name,
                cid: e.cid,
                kind: None,
            })
            .collect())
    }

    async fn entry_kind(&self, cid: &ContentId) -> Result<EntryKind> {
        let blocks = self.blocks.read().unwrap();
        let block = blocks.get(cid).ok_or_else(|| StoreError::NotFound {
            cid: cid.clone(),
        })?;
        Ok(block.kind)
    }

    async fn put_directory(&self, entries: &[DirectoryEntry]) -> Result<ContentId> {
        let node = DirectoryNode::new(entries.to_vec());
        let data = serde_json_canonicalizer::to_vec(&node).map_err(|e| StoreError::Malformed {
            cid: String::new(),
            message: e.to_string(),
        })?;
        let cid = content_id(&data);
        self.blocks.write().unwrap().insert(
            cid.clone(),
            Block {
                data,
                kind: EntryKind::Directory,
            },
        );
        Ok(cid)
    }

    async fn fetch_file(&self, root: &ContentId, path: &str) -> Result<Vec<u8>> {
        let mut current = root.clone();
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();

        while let Some(segment) = segments.next() {
            let node = self.read_directory(&current)?;
            let entry = node
                .entries
                .iter()
                .find(|e| e.name == segment)
                .ok_or_else(|| StoreError::NotFound {
                    cid: format!("{}/{}", root, path),
                })?;
            if segments.peek().is_some() {
                current = entry.cid.clone();
            } else {
                let blocks = self.blocks.read().unwrap();
                let block = blocks.get(&entry.cid).ok_or_else(|| StoreError::NotFound {
                    cid: entry.cid.clone(),
                })?;
                return Ok(block.data.clone());
            }
        }
        Err(StoreError::NotFound {
            cid: format!("{}/{}", root, path),
        })
    }

    async fn export_archive(&self, root: &ContentId, included: &[ContentId]) -> Result<Vec<u8>> {
        let node = self.read_directory(root)?;
        let refs: Vec<ArchiveRef> = node
            .entries
            .iter()
            .map(|e| ArchiveRef {
                name: e.name.clone(),
                cid: e.cid.clone(),
                kind: e.kind.label().to_string(),
            })
            .collect();

        let blocks = self.blocks.read().unwrap();
        let mut payloads = Vec::with_capacity(included.len());
        for cid in included {
            let block = blocks.get(cid).ok_or_else(|| StoreError::NotFound {
                cid: cid.clone(),
            })?;
            payloads.push((cid.clone(), block.data.clone()));
        }

        archive::encode(root, refs, payloads).map_err(|e| StoreError::Malformed {
            cid: root.clone(),
            message: e.to_string(),
        })
    }
}

/// The CID of a block: sha-256 of its bytes, lowercase hex.
fn content_id(data: &[u8]) -> ContentId {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
