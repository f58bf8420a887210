//! Class token normalization.
//!
//! A [`ClassSet`] is the canonical form of a class string: split on whitespace,
//! empty tokens dropped, deduplicated, sorted lexicographically.
//!
//! Sorting discards declaration order. In utility CSS two conflicting utilities
//! at equal specificity resolve by stylesheet order, not by attribute order, so
//! the generated `@apply` body can differ visually from the inline original only
//! when the inline string relied on a tool (e.g. a class merger) to pick a winner.
//! The canonical order is kept anyway because it is what makes duplicates
//! comparable character for character.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Deduplicated, lexicographically sorted class tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassSet(Vec<String>);

impl ClassSet {
    /// Canonicalize a whitespace-separated class string.
    pub fn parse(raw: &str) -> Self {
        Self::from_tokens(raw.split_whitespace())
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self(set.into_iter().collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.binary_search_by(|t| t.as_str().cmp(token)).is_ok()
    }

    /// Space-joined canonical string, the identity key for exact duplicates.
    pub fn canonical(&self) -> String {
        self.0.join(" ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// `normalize(normalize(s)) == normalize(s)`
pub fn normalize(raw: &str) -> String {
    ClassSet::parse(raw).canonical()
}

/// Tokens in declaration order with duplicates removed (first occurrence kept).
pub fn declared_tokens(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split_whitespace()
        .filter(|t| seen.insert(*t))
        .map(str::to_string)
        .collect()
}
