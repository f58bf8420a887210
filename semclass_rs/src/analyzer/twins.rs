//! Twins: markers whose class sets are character-for-character identical.
//!
//! Two markers land in the same group iff their canonical strings are equal.
//! These are candidates for consolidation into one semantic class.

use std::collections::BTreeMap;

use serde::Serialize;

use super::mapping::ClassSetEntry;
use crate::types::Location;

/// One exact-duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Canonical class string shared by every member
    pub canonical: String,
    /// Distinct markers, sorted
    pub markers: Vec<String>,
    pub locations: Vec<Location>,
}

/// Groups with at least two distinct markers, largest first, then by canonical string.
pub fn find_exact_duplicates(entries: &[ClassSetEntry]) -> Vec<DuplicateGroup> {
    let mut by_canonical: BTreeMap<&str, Vec<&ClassSetEntry>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.class_set.is_empty()) {
        by_canonical.entry(&entry.canonical).or_default().push(entry);
    }

    let mut groups: Vec<DuplicateGroup> = by_canonical
        .into_iter()
        .filter_map(|(canonical, members)| {
            let mut markers: Vec<String> = members.iter().map(|e| e.marker.clone()).collect();
            markers.sort();
            markers.dedup();
            if markers.len() < 2 {
                return None;
            }
            let mut locations: Vec<Location> = members
                .iter()
                .flat_map(|e| e.locations.iter().cloned())
                .collect();
            locations.sort();
            Some(DuplicateGroup {
                canonical: canonical.to_string(),
                markers,
                locations,
            })
        })
        .collect();

    groups.sort_by(|a, b| {
        b.markers
            .len()
            .cmp(&a.markers.len())
            .then_with(|| a.canonical.cmp(&b.canonical))
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::mapping::MappingStore;
    use crate::analyzer::normalize::ClassSet;

    fn entries(items: &[(&str, &str)]) -> Vec<ClassSetEntry> {
        let mut store = MappingStore::new();
        for (i, (marker, classes)) in items.iter().enumerate() {
            store.insert(
                marker,
                Location {
                    file: "x.tsx".into(),
                    line: i + 1,
                    column: 1,
                },
                "div",
                ClassSet::parse(classes),
            );
        }
        store.distinct_sets()
    }

    #[test]
    fn test_reordered_tokens_are_one_group() {
        let groups = find_exact_duplicates(&entries(&[
            ("btn-a", "flex gap-2"),
            ("btn-b", "gap-2 flex"),
            ("other", "flex gap-4"),
        ]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].canonical, "flex gap-2");
        assert_eq!(groups[0].markers, vec!["btn-a", "btn-b"]);
        assert_eq!(groups[0].locations.len(), 2);
    }

    #[test]
    fn test_single_marker_reused_is_not_a_duplicate() {
        let groups = find_exact_duplicates(&entries(&[("card", "p-4"), ("card", "p-4")]));
        assert!(groups.is_empty());
    }

    #[test]
    fn test_group_iff_canonical_equal() {
        let list = entries(&[
            ("a", "flex gap-2"),
            ("b", "flex  gap-2 flex"),
            ("c", "flex gap-2 p-1"),
            ("d", "p-1 gap-2 flex"),
        ]);
        let groups = find_exact_duplicates(&list);
        assert_eq!(groups.len(), 2);
        for group in &groups {
            for marker in &group.markers {
                let entry = list.iter().find(|e| &e.marker == marker).unwrap();
                assert_eq!(entry.canonical, group.canonical);
            }
        }
    }
}
