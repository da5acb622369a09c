//! DAG store client boundary.
//!
//! The engines never hold block bytes; they talk to a [`DagStore`] that owns
//! all storage. Two implementations are provided: an in-memory store used by
//! tests and fixtures, and an HTTP client for a Kubo-compatible RPC API.

mod dag_store;
mod http_store;
mod memory_store;

pub use dag_store::{DagStore, RawChild, Result, StoreError};
pub use http_store::HttpDagStore;
pub use memory_store::MemoryDagStore;
