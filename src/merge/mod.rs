//! Multi-root directory merging.
//!
//! The merge engine combines the direct children of one or more directory
//! roots into a single new directory node:
//!
//! 1. Each root's children are listed concurrently.
//! 2. Entry kinds are settled via the extension heuristic, falling back to a
//!    bounded pool of store lookups for anything the heuristic cannot decide.
//! 3. Children are grouped by name and conflicts resolved: identical
//!    candidates collapse, disagreeing candidates exclude the name entirely.
//! 4. The resolved entries are materialized as a new node; nothing is written
//!    before this final step.
//!
//! Merging a single root is the identity operation on its listing and is the
//! basis for directory extraction.

mod engine;
mod error;
mod resolve;

pub use engine::{merge, resolve_child_kinds, MergeOutcome};
pub use error::{MergeError, Result};
pub use resolve::{resolve_entries, ExcludedName};
