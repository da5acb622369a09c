//! The portable block container written by shallow exports.
//!
//! A self-describing canonical-JSON document: a version tag, the root CID,
//! the root's entry-reference records (name/kind/CID triples, enough for an
//! importer to reconstruct the listing), and the included blocks with
//! base64-encoded payloads. File content is never embedded; an importer
//! fetches leaf bytes from elsewhere.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ContentId;

/// Container format version. Bump on any incompatible layout change.
pub const ARCHIVE_VERSION: u32 = 1;

/// Error type for archive encoding/decoding.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive serialization error: {0}")]
    Serialize(String),

    #[error("archive deserialization error: {0}")]
    Deserialize(String),

    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid block payload for {cid}: {message}")]
    InvalidBlock { cid: ContentId, message: String },
}

/// One entry-reference record of the archived root's listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRef {
    pub name: String,
    pub cid: ContentId,
    pub kind: String,
}

/// One included block with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveBlock {
    pub cid: ContentId,
    /// Base64-encoded block bytes.
    pub data: String,
}

/// The decoded archive document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    pub version: u32,
    pub root: ContentId,
    pub refs: Vec<ArchiveRef>,
    pub blocks: Vec<ArchiveBlock>,
}

impl Archive {
    /// Decode the base64 payload of a contained block.
    pub fn block_bytes(&self, cid: &str) -> Option<std::result::Result<Vec<u8>, ArchiveError>> {
        let block = self.blocks.iter().find(|b| b.cid == cid)?;
        Some(
            BASE64
                .decode(&block.data)
                .map_err(|e| ArchiveError::InvalidBlock {
                    cid: block.cid.clone(),
                    message: e.to_string(),
                }),
        )
    }

    /// Whether the archive contains a block for `cid`.
    pub fn contains_block(&self, cid: &str) -> bool {
        self.blocks.iter().any(|b| b.cid == cid)
    }
}

/// Encode an archive document.
///
/// Blocks are sorted by CID so identical inputs produce identical bytes.
pub fn encode(
    root: &ContentId,
    refs: Vec<ArchiveRef>,
    blocks: Vec<(ContentId, Vec<u8>)>,
) -> std::result::Result<Vec<u8>, ArchiveError> {
    let mut blocks: Vec<ArchiveBlock> = blocks
        .into_iter()
        .map(|(cid, data)| ArchiveBlock {
            cid,
            data: BASE64.encode(data),
        })
        .collect();
    blocks.sort_by(|a, b| a.cid.cmp(&b.cid));

    let archive = Archive {
        version: ARCHIVE_VERSION,
        root: root.clone(),
        refs,
        blocks,
    };
    serde_json_canonicalizer::to_vec(&archive).map_err(|e| ArchiveError::Serialize(e.to_string()))
}

/// Decode an archive document, rejecting unknown versions.
pub fn decode(bytes: &[u8]) -> std::result::Result<Archive, ArchiveError> {
    let archive: Archive =
        serde_json::from_slice(bytes).map_err(|e| ArchiveError::Deserialize(e.to_string()))?;
    if archive.version != ARCHIVE_VERSION {
        return Err(ArchiveError::UnsupportedVersion(archive.version));
    }
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let refs = vec![ArchiveRef {
            name: "a.txt".to_string(),
            cid: "cid-a".to_string(),
            kind: "file".to_string(),
        }];
        let blocks = vec![("cid-root".to_string(), b"block bytes".to_vec())];
        let bytes = encode(&"cid-root".to_string(), refs.clone(), blocks).unwrap();

        let archive = decode(&bytes).unwrap();
        assert_eq!(archive.version, ARCHIVE_VERSION);
        assert_eq!(archive.root, "cid-root");
        assert_eq!(archive.refs, refs);
        assert_eq!(
            archive.block_bytes("cid-root").unwrap().unwrap(),
            b"block bytes"
        );
    }

    #[test]
    fn test_encode_is_deterministic() {
        let blocks_a = vec![
            ("cid-b".to_string(), b"b".to_vec()),
            ("cid-a".to_string(), b"a".to_vec()),
        ];
        let blocks_b = vec![
            ("cid-a".to_string(), b"a".to_vec()),
            ("cid-b".to_string(), b"b".to_vec()),
        ];
        let root = "cid-root".to_string();
        let a = encode(&root, vec![], blocks_a).unwrap();
        let b = encode(&root, vec![], blocks_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let json = r#"{"version":99,"root":"r","refs":[],"blocks":[]}"#;
        let result = decode(json.as_bytes());
        assert!(matches!(result, Err(ArchiveError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_missing_block_is_none() {
        let bytes = encode(&"r".to_string(), vec![], vec![]).unwrap();
        let archive = decode(&bytes).unwrap();
        assert!(archive.block_bytes("absent").is_none());
        assert!(!archive.contains_block("absent"));
    }
}
