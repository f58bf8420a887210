//! Pairwise similarity between class sets.
//!
//! Every function here is symmetric and total: disjoint or empty sets score 0,
//! they never panic.

use crate::analyzer::normalize::ClassSet;

/// Size of the intersection of two canonical (sorted, deduplicated) sets.
pub fn intersection_len(a: &ClassSet, b: &ClassSet) -> usize {
    let (a, b) = (a.tokens(), b.tokens());
    let (mut i, mut j, mut count) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

/// |A∩B| / |A∪B|
pub fn jaccard(a: &ClassSet, b: &ClassSet) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let inter = intersection_len(a, b);
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// 2|A∩B| / (|A|+|B|)
pub fn dice(a: &ClassSet, b: &ClassSet) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    2.0 * intersection_len(a, b) as f64 / total as f64
}

/// Edit distance between the canonical strings.
pub fn levenshtein_distance(a: &ClassSet, b: &ClassSet) -> usize {
    strsim::levenshtein(&a.canonical(), &b.canonical())
}

/// 1 - distance / max(len). Two empty strings are identical (1.0).
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - strsim::levenshtein(a, b) as f64 / max_len as f64
}

/// Tokens on both sides, then tokens only on the left, then only on the right.
pub fn token_diff(a: &ClassSet, b: &ClassSet) -> (Vec<String>, Vec<String>, Vec<String>) {
    let shared = a.iter().filter(|t| b.contains(t)).map(str::to_string).collect();
    let left = a.iter().filter(|t| !b.contains(t)).map(str::to_string).collect();
    let right = b.iter().filter(|t| !a.contains(t)).map(str::to_string).collect();
    (shared, left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(raw: &str) -> ClassSet {
        ClassSet::parse(raw)
    }

    #[test]
    fn test_gap_variant_pair() {
        let a = set("flex gap-2 items-center");
        let b = set("flex gap-4 items-center");
        assert!((jaccard(&a, &b) - 0.5).abs() < f64::EPSILON);
        assert!((dice(&a, &b) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(levenshtein_distance(&a, &b), 1);
    }

    #[test]
    fn test_symmetry() {
        let samples = [
            set(""),
            set("flex"),
            set("flex gap-2"),
            set("p-4 m-2 rounded"),
            set("grid grid-cols-3 gap-6"),
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(jaccard(a, b), jaccard(b, a));
                assert_eq!(dice(a, b), dice(b, a));
                assert_eq!(levenshtein_distance(a, b), levenshtein_distance(b, a));
                assert_eq!(
                    levenshtein_similarity(&a.canonical(), &b.canonical()),
                    levenshtein_similarity(&b.canonical(), &a.canonical())
                );
            }
        }
    }

    #[test]
    fn test_disjoint_and_empty_sets() {
        let empty = set("");
        let a = set("flex");
        let b = set("grid");
        assert_eq!(jaccard(&a, &b), 0.0);
        assert_eq!(dice(&a, &b), 0.0);
        assert_eq!(jaccard(&empty, &empty), 0.0);
        assert_eq!(dice(&empty, &a), 0.0);
        assert_eq!(levenshtein_similarity("", ""), 1.0);
        assert_eq!(levenshtein_similarity("", "flex"), 0.0);
    }

    #[test]
    fn test_token_diff() {
        let (shared, left, right) = token_diff(&set("flex gap-2 p-4"), &set("flex gap-4"));
        assert_eq!(shared, vec!["flex"]);
        assert_eq!(left, vec!["gap-2", "p-4"]);
        assert_eq!(right, vec!["gap-4"]);
    }
}
