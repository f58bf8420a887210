//! Types for the duplicate/similarity report

use serde::Serialize;

use crate::analyzer::twins::DuplicateGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Jaccard,
    Dice,
    Levenshtein,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jaccard => "jaccard",
            Self::Dice => "dice",
            Self::Levenshtein => "levenshtein",
        }
    }
}

/// One side of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairSide {
    pub marker: String,
    pub canonical: String,
}

/// Two class sets compared under one metric.
///
/// Sides are ordered by (marker, canonical), so a pair reads the same whichever
/// way round it was computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityPair {
    pub metric: Metric,
    /// 0.0-1.0, higher is more similar
    pub score: f64,
    /// Edit distance, Levenshtein pairs only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<usize>,
    pub left: PairSide,
    pub right: PairSide,
    pub shared: Vec<String>,
    pub left_only: Vec<String>,
    pub right_only: Vec<String>,
}

/// Markers sharing one stemmed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCluster {
    /// Stemmed token (`p{dir}-{n}`, `bg-{color}`)
    pub stem: String,
    /// Original tokens that collapsed into the stem
    pub tokens: Vec<String>,
    pub markers: Vec<String>,
    /// Number of element sites using the stem
    pub occurrences: usize,
}

/// Markers whose whole stemmed set is identical while their real sets differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCluster {
    pub stems: Vec<String>,
    pub markers: Vec<String>,
    pub canonicals: Vec<String>,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    /// Distinct (marker, class set) pairs analysed
    pub total_sets: usize,
    pub exact: Vec<DuplicateGroup>,
    pub jaccard: Vec<SimilarityPair>,
    pub dice: Vec<SimilarityPair>,
    pub levenshtein: Vec<SimilarityPair>,
    pub token_clusters: Vec<TokenCluster>,
    pub pattern_clusters: Vec<PatternCluster>,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
            && self.jaccard.is_empty()
            && self.dice.is_empty()
            && self.levenshtein.is_empty()
            && self.token_clusters.is_empty()
            && self.pattern_clusters.is_empty()
    }
}
