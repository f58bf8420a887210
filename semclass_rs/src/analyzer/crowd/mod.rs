//! Crowd detection over class sets: exact duplicates, fuzzy pairs, stemmed clusters.
//!
//! Input is the list of distinct (marker, class set) pairs from the merged
//! mapping store. Pairs that share a marker or a canonical string are skipped for
//! the fuzzy metrics; the latter are already reported as exact duplicates.

pub mod clustering;
pub mod output;
pub mod similarity;
pub mod types;

pub use clustering::{pattern_clusters, stem_token, token_clusters};
pub use output::format_report;
pub use similarity::{dice, jaccard, levenshtein_distance, levenshtein_similarity};
pub use types::*;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::analyzer::mapping::ClassSetEntry;
use crate::analyzer::twins::find_exact_duplicates;
use crate::config::SimilarityConfig;

/// Run every metric over `entries`.
pub fn analyze(entries: &[ClassSetEntry], config: &SimilarityConfig) -> DuplicateReport {
    let mut seen = BTreeSet::new();
    let entries: Vec<&ClassSetEntry> = entries
        .iter()
        .filter(|e| !e.class_set.is_empty())
        .filter(|e| seen.insert((e.marker.as_str(), e.canonical.as_str())))
        .collect();

    let mut jaccard_pairs = Vec::new();
    let mut dice_pairs = Vec::new();
    let mut levenshtein_pairs = Vec::new();

    for (i, a) in entries.iter().enumerate() {
        for b in entries.iter().skip(i + 1) {
            if a.marker == b.marker || a.canonical == b.canonical {
                continue;
            }

            let j = similarity::jaccard(&a.class_set, &b.class_set);
            if j >= config.threshold {
                jaccard_pairs.push(make_pair(Metric::Jaccard, j, None, a, b));
            }

            let d = similarity::dice(&a.class_set, &b.class_set);
            if d >= config.threshold {
                dice_pairs.push(make_pair(Metric::Dice, d, None, a, b));
            }

            let distance = strsim::levenshtein(&a.canonical, &b.canonical);
            if distance > 0 && distance <= config.max_distance {
                let score = similarity::levenshtein_similarity(&a.canonical, &b.canonical);
                levenshtein_pairs.push(make_pair(Metric::Levenshtein, score, Some(distance), a, b));
            }
        }
    }

    sort_pairs(&mut jaccard_pairs);
    sort_pairs(&mut dice_pairs);
    levenshtein_pairs.sort_by(|a, b| {
        a.distance
            .cmp(&b.distance)
            .then_with(|| by_score_then_names(a, b))
    });
    jaccard_pairs.truncate(config.max_pairs);
    dice_pairs.truncate(config.max_pairs);
    levenshtein_pairs.truncate(config.max_pairs);

    let owned: Vec<ClassSetEntry> = entries.iter().map(|e| (*e).clone()).collect();
    DuplicateReport {
        total_sets: owned.len(),
        exact: find_exact_duplicates(&owned),
        jaccard: jaccard_pairs,
        dice: dice_pairs,
        levenshtein: levenshtein_pairs,
        token_clusters: token_clusters(&owned, config.min_cluster_size),
        pattern_clusters: pattern_clusters(&owned, config.min_cluster_size),
    }
}

fn make_pair(
    metric: Metric,
    score: f64,
    distance: Option<usize>,
    a: &ClassSetEntry,
    b: &ClassSetEntry,
) -> SimilarityPair {
    let (left, right) = if (&a.marker, &a.canonical) <= (&b.marker, &b.canonical) {
        (a, b)
    } else {
        (b, a)
    };
    let (shared, left_only, right_only) =
        similarity::token_diff(&left.class_set, &right.class_set);
    SimilarityPair {
        metric,
        score,
        distance,
        left: PairSide {
            marker: left.marker.clone(),
            canonical: left.canonical.clone(),
        },
        right: PairSide {
            marker: right.marker.clone(),
            canonical: right.canonical.clone(),
        },
        shared,
        left_only,
        right_only,
    }
}

fn by_score_then_names(a: &SimilarityPair, b: &SimilarityPair) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.left.marker.cmp(&b.left.marker))
        .then_with(|| a.right.marker.cmp(&b.right.marker))
        .then_with(|| a.left.canonical.cmp(&b.left.canonical))
        .then_with(|| a.right.canonical.cmp(&b.right.canonical))
}

fn sort_pairs(pairs: &mut [SimilarityPair]) {
    pairs.sort_by(by_score_then_names);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::normalize::ClassSet;

    fn entry(marker: &str, classes: &str) -> ClassSetEntry {
        let class_set = ClassSet::parse(classes);
        ClassSetEntry {
            marker: marker.to_string(),
            canonical: class_set.canonical(),
            class_set,
            locations: Vec::new(),
        }
    }

    fn config() -> SimilarityConfig {
        SimilarityConfig::default()
    }

    #[test]
    fn test_gap_pair_in_every_fuzzy_list() {
        let entries = vec![
            entry("row-tight", "flex gap-2 items-center"),
            entry("row-loose", "flex gap-4 items-center"),
        ];
        let mut cfg = config();
        cfg.threshold = 0.5;
        let report = analyze(&entries, &cfg);
        assert_eq!(report.jaccard.len(), 1);
        assert!((report.jaccard[0].score - 0.5).abs() < 1e-9);
        assert_eq!(report.jaccard[0].left.marker, "row-loose");
        assert_eq!(report.jaccard[0].shared, vec!["flex", "items-center"]);
        assert_eq!(report.jaccard[0].left_only, vec!["gap-4"]);
        assert_eq!(report.dice.len(), 1);
        assert_eq!(report.levenshtein.len(), 1);
        assert_eq!(report.levenshtein[0].distance, Some(1));
        assert!(report.exact.is_empty());
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let entries = vec![
            entry("a", "flex gap-2 items-center"),
            entry("b", "flex gap-4 items-center"),
            entry("c", "flex gap-2 items-start"),
            entry("d", "grid"),
        ];
        let mut reversed = entries.clone();
        reversed.reverse();
        let one = analyze(&entries, &config());
        let two = analyze(&reversed, &config());
        assert_eq!(one.jaccard, two.jaccard);
        assert_eq!(one.dice, two.dice);
        assert_eq!(one.levenshtein, two.levenshtein);
        assert_eq!(one.exact, two.exact);
    }

    #[test]
    fn test_exact_duplicates_not_repeated_as_fuzzy_pairs() {
        let entries = vec![entry("btn-a", "flex gap-2"), entry("btn-b", "gap-2 flex")];
        let report = analyze(&entries, &config());
        assert_eq!(report.exact.len(), 1);
        assert_eq!(report.exact[0].markers, vec!["btn-a", "btn-b"]);
        assert!(report.jaccard.is_empty());
        assert!(report.levenshtein.is_empty());
    }

    #[test]
    fn test_same_marker_variants_not_paired() {
        let entries = vec![entry("card", "p-4"), entry("card", "p-6")];
        let report = analyze(&entries, &config());
        assert!(report.levenshtein.is_empty());
        assert!(report.jaccard.is_empty());
    }

    #[test]
    fn test_disjoint_sets_never_error() {
        let entries = vec![entry("a", "flex"), entry("b", "grid"), entry("c", "")];
        let report = analyze(&entries, &config());
        assert!(report.jaccard.is_empty());
        assert_eq!(report.total_sets, 2);
    }

    #[test]
    fn test_max_pairs_truncates() {
        let entries: Vec<ClassSetEntry> = (0..6)
            .map(|i| entry(&format!("m{i}"), &format!("flex items-center gap-{i}")))
            .collect();
        let mut cfg = config();
        cfg.threshold = 0.1;
        cfg.max_pairs = 4;
        let report = analyze(&entries, &cfg);
        assert_eq!(report.jaccard.len(), 4);
        assert_eq!(report.levenshtein.len(), 4);
    }
}
