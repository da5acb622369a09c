//! Core data model for directory DAG manipulation.
//!
//! Directory nodes are stored as canonical JSON (RFC 8785) so that
//! materializing the same entry set always produces byte-identical blocks,
//! which is what makes merge results reproducible.

use serde::{Deserialize, Serialize};

/// A content identifier: an opaque, content-derived string. Two equal CIDs
/// refer to byte-identical blocks; equality is plain string equality.
pub type ContentId = String;

/// The kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Short lowercase label, used in archive reference records and logs.
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// A single named entry of a directory node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Entry name, unique within a resolved directory listing.
    pub name: String,
    /// CID of the referenced block.
    pub cid: ContentId,
    /// Whether the entry references a file or a directory.
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn file(name: impl Into<String>, cid: impl Into<ContentId>) -> Self {
        Self {
            name: name.into(),
            cid: cid.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>, cid: impl Into<ContentId>) -> Self {
        Self {
            name: name.into(),
            cid: cid.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// The wire form of a directory node.
///
/// This is what the store serializes when a directory is materialized. A
/// "merge" never mutates an existing node; it always creates a new one of
/// these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Type discriminator, always "Directory".
    #[serde(rename = "type")]
    pub type_tag: DirectoryNodeType,
    /// Entries sorted by name.
    pub entries: Vec<DirectoryEntry>,
}

/// Type tag for directory nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryNodeType {
    Directory,
}

impl DirectoryNode {
    /// Build a node from entries, sorting by name for a stable byte form.
    pub fn new(mut entries: Vec<DirectoryEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            type_tag: DirectoryNodeType::Directory,
            entries,
        }
    }
}

/// A request to merge one or more directory roots.
///
/// Constructed by the driver, consumed once by the merge engine.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Root CIDs to merge, in caller order. Must be non-empty.
    pub roots: Vec<ContentId>,
    /// When true, every entry's kind is confirmed against the store instead
    /// of trusting the extension heuristic.
    pub force_check_directories: bool,
}

impl MergeRequest {
    pub fn new(roots: Vec<ContentId>, force_check_directories: bool) -> Self {
        Self {
            roots,
            force_check_directories,
        }
    }
}
