//! Item extraction from archival files-listing manifests.
//!
//! An archival item root carries `<identifier>_files.xml` manifests
//! enumerating the item's constituent files. Extraction parses each manifest
//! and synthesizes a directory node that references the already-stored
//! subtrees. No leaf content is ever recreated, only new directory
//! structure pointing at existing blocks.

mod engine;
mod manifest;

pub use engine::{
    extract_items, synthesize_directory, ExtractError, ExtractOutcome, ExtractedItem,
    ManifestFailure, Result,
};
pub use manifest::{parse_files_manifest, ExtractionManifest, ManifestFile, ManifestParseError};
