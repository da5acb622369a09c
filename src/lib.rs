//! dagweld - directory DAG merge and extraction for content-addressed stores.

pub mod classify;
pub mod cli;
pub mod config;
pub mod export;
pub mod extract;
pub mod merge;
pub mod model;
pub mod report;
pub mod store;

pub use classify::{classify, Classification};
pub use model::{ContentId, DirectoryEntry, DirectoryNode, EntryKind, MergeRequest};
pub use store::{DagStore, HttpDagStore, MemoryDagStore, RawChild, StoreError};
