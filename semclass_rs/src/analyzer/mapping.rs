//! Mapping store: marker name → class set + every site it was seen at.
//!
//! Each file produces its own store ([`MappingStore::from_file`]); stores are
//! combined with [`MappingStore::merge`], which is commutative and associative.
//! Parallel workers can therefore finish in any order.
//!
//! A marker reused with a different class set is not an error. The effective set
//! is the one observed last, where "last" means the greatest (file, line, column)
//! so the result does not depend on merge order. Such markers are listed by
//! [`MappingStore::conflicts`]; whether "latest wins" is intended or an accident
//! of the original tool is an open question for its maintainers.

use std::collections::BTreeMap;

use serde::Serialize;

use super::normalize::ClassSet;
use crate::types::{FileExtraction, Location};

/// One site where a marker was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingSite {
    pub location: Location,
    pub tag: String,
    pub class_set: ClassSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerEntry {
    pub marker: String,
    /// Class set of the last observed site
    pub effective: ClassSet,
    /// Sorted by location
    pub sites: Vec<MappingSite>,
}

impl MarkerEntry {
    fn refresh(&mut self) {
        self.sites.sort_by(|a, b| a.location.cmp(&b.location));
        self.sites.dedup_by(|a, b| a.location == b.location);
        if let Some(last) = self.sites.last() {
            self.effective = last.class_set.clone();
        }
    }

    /// Distinct class sets used with this marker, in first-seen order.
    pub fn variants(&self) -> Vec<&ClassSet> {
        let mut out: Vec<&ClassSet> = Vec::new();
        for site in &self.sites {
            if !out.contains(&&site.class_set) {
                out.push(&site.class_set);
            }
        }
        out
    }
}

/// One distinct (marker, class set) pair, input to duplicate and similarity analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSetEntry {
    pub marker: String,
    pub class_set: ClassSet,
    pub canonical: String,
    pub locations: Vec<Location>,
}

/// Same marker, different class sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerConflict {
    pub marker: String,
    pub effective: ClassSet,
    pub variants: Vec<ConflictVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictVariant {
    pub class_set: ClassSet,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingStore {
    entries: BTreeMap<String, MarkerEntry>,
}

impl MappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure function of one file's extraction.
    pub fn from_file(extraction: &FileExtraction) -> Self {
        let mut store = Self::new();
        for occ in extraction.mapped() {
            if let Some(marker) = occ.marker_name() {
                store.insert(marker, occ.location.clone(), &occ.tag, occ.class_set.clone());
            }
        }
        store
    }

    pub fn insert(&mut self, marker: &str, location: Location, tag: &str, class_set: ClassSet) {
        if class_set.is_empty() {
            return;
        }
        let entry = self
            .entries
            .entry(marker.to_string())
            .or_insert_with(|| MarkerEntry {
                marker: marker.to_string(),
                effective: ClassSet::default(),
                sites: Vec::new(),
            });
        entry.sites.push(MappingSite {
            location,
            tag: tag.to_string(),
            class_set,
        });
        entry.refresh();
    }

    /// Order-independent reduce step.
    pub fn merge(mut self, other: Self) -> Self {
        for (marker, incoming) in other.entries {
            match self.entries.get_mut(&marker) {
                Some(existing) => {
                    existing.sites.extend(incoming.sites);
                    existing.refresh();
                }
                None => {
                    self.entries.insert(marker, incoming);
                }
            }
        }
        self
    }

    pub fn merge_all(stores: impl IntoIterator<Item = Self>) -> Self {
        stores.into_iter().fold(Self::new(), Self::merge)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, marker: &str) -> Option<&MarkerEntry> {
        self.entries.get(marker)
    }

    pub fn effective(&self, marker: &str) -> Option<&ClassSet> {
        self.entries.get(marker).map(|e| &e.effective)
    }

    /// Entries sorted by marker name.
    pub fn entries(&self) -> impl Iterator<Item = &MarkerEntry> {
        self.entries.values()
    }

    /// Every distinct (marker, class set) pair, sorted by marker then canonical form.
    pub fn distinct_sets(&self) -> Vec<ClassSetEntry> {
        let mut out = Vec::new();
        for entry in self.entries.values() {
            let mut variants = entry.variants();
            variants.sort();
            for set in variants {
                out.push(ClassSetEntry {
                    marker: entry.marker.clone(),
                    class_set: set.clone(),
                    canonical: set.canonical(),
                    locations: entry
                        .sites
                        .iter()
                        .filter(|site| &site.class_set == set)
                        .map(|site| site.location.clone())
                        .collect(),
                });
            }
        }
        out
    }

    pub fn conflicts(&self) -> Vec<MarkerConflict> {
        self.entries
            .values()
            .filter(|entry| entry.variants().len() > 1)
            .map(|entry| MarkerConflict {
                marker: entry.marker.clone(),
                effective: entry.effective.clone(),
                variants: entry
                    .variants()
                    .into_iter()
                    .map(|set| ConflictVariant {
                        class_set: set.clone(),
                        locations: entry
                            .sites
                            .iter()
                            .filter(|site| &site.class_set == set)
                            .map(|site| site.location.clone())
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }
}
