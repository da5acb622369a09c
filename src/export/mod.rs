//! Shallow archive export.
//!
//! A merge or extraction produces new directory nodes on a store that
//! already holds everything else. Export packages just those new nodes into
//! a portable block container so the result can travel without re-shipping
//! content both sides already have.

pub mod archive;
mod exporter;

pub use archive::{Archive, ArchiveBlock, ArchiveError, ArchiveRef, ARCHIVE_VERSION};
pub use exporter::{export_shallow, ExportError, Result};
