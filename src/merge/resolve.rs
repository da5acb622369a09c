//! Name-level conflict resolution.
//!
//! Conflicts are an expected outcome, not an anomaly, so resolution returns
//! tagged values rather than erroring: every name either yields a resolved
//! entry or lands in the excluded report.

use std::collections::BTreeMap;

use crate::model::{ContentId, DirectoryEntry};

/// A name dropped from a merge because its candidates disagreed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedName {
    pub name: String,
    /// The disagreeing candidate CIDs, in root order, deduplicated.
    pub cids: Vec<ContentId>,
}

/// Resolve candidates grouped by name into a final entry list.
///
/// - One candidate: included unchanged.
/// - Several candidates, all with the same CID and kind: included once.
/// - Several candidates that disagree: the name is excluded entirely
///   (neither version is kept) and reported. The merge result never silently
///   picks one of several conflicting versions of the same path.
///
/// Input iteration order is by name (`BTreeMap`), so output is deterministic.
pub fn resolve_entries(
    by_name: BTreeMap<String, Vec<DirectoryEntry>>,
) -> (Vec<DirectoryEntry>, Vec<ExcludedName>) {
    let mut resolved = Vec::with_capacity(by_name.len());
    let mut excluded = Vec::new();

    for (name, candidates) in by_name {
        debug_assert!(!candidates.is_empty());
        let first = &candidates[0];
        let identical = candidates
            .iter()
            .all(|c| c.cid == first.cid && c.kind == first.kind);

        if identical {
            resolved.push(first.clone());
        } else {
            let mut cids: Vec<ContentId> = Vec::new();
            for candidate in &candidates {
                if !cids.contains(&candidate.cid) {
                    cids.push(candidate.cid.clone());
                }
            }
            excluded.push(ExcludedName { name, cids });
        }
    }

    (resolved, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(entries: Vec<DirectoryEntry>) -> BTreeMap<String, Vec<DirectoryEntry>> {
        let mut by_name: BTreeMap<String, Vec<DirectoryEntry>> = BTreeMap::new();
        for entry in entries {
            by_name.entry(entry.name.clone()).or_default().push(entry);
        }
        by_name
    }

    #[test]
    fn test_single_candidates_pass_through() {
        let (resolved, excluded) = resolve_entries(group(vec![
            DirectoryEntry::file("a.txt", "c1"),
            DirectoryEntry::file("b.txt", "c2"),
        ]));
        assert_eq!(resolved.len(), 2);
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_identical_candidates_collapse() {
        let (resolved, excluded) = resolve_entries(group(vec![
            DirectoryEntry::file("a.txt", "c1"),
            DirectoryEntry::file("a.txt", "c1"),
        ]));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].cid, "c1");
        assert!(excluded.is_empty());
    }

    #[test]
    fn test_conflicting_candidates_are_excluded() {
        let (resolved, excluded) = resolve_entries(group(vec![
            DirectoryEntry::file("a.txt", "c1"),
            DirectoryEntry::file("a.txt", "c2"),
        ]));
        assert!(resolved.is_empty());
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].name, "a.txt");
        assert_eq!(excluded[0].cids, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn test_same_cid_different_kind_is_a_conflict() {
        let (resolved, excluded) = resolve_entries(group(vec![
            DirectoryEntry::file("x", "c1"),
            DirectoryEntry::directory("x", "c1"),
        ]));
        assert!(resolved.is_empty());
        assert_eq!(excluded.len(), 1);
        // Both candidates share the CID, so only one is reported.
        assert_eq!(excluded[0].cids, vec!["c1".to_string()]);
    }

    #[test]
    fn test_output_is_sorted_by_name() {
        let (resolved, _) = resolve_entries(group(vec![
            DirectoryEntry::file("z.txt", "c1"),
            DirectoryEntry::file("a.txt", "c2"),
            DirectoryEntry::file("m.txt", "c3"),
        ]));
        let names: Vec<&str> = resolved.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "m.txt", "z.txt"]);
    }
}
