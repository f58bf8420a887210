//! Stemmed clustering: collapse related utility tokens into buckets and find
//! combinations that keep reappearing under different marker names.
//!
//! Stems are only used here. Identity comparisons always use the real tokens.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;

use super::types::{PatternCluster, TokenCluster};
use crate::analyzer::mapping::ClassSetEntry;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex literal")
}

const COLORS: &str = "slate|gray|zinc|neutral|stone|red|orange|amber|yellow|lime|green|emerald|teal|cyan|sky|blue|indigo|violet|purple|fuchsia|pink|rose|black|white|transparent|current|inherit|primary|secondary|accent|muted|foreground|background|destructive|border|ring|card|popover";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    /// Utility after the last `:`
    Base,
    /// `hover:md:` prefix
    Variants,
}

struct StemRule {
    name: &'static str,
    part: Part,
    patterns: Vec<(Regex, &'static str)>,
}

/// Ordered: magnitude, numeric scale, color, direction, state, axis, sizing
/// keyword, border-style. Later rules see the output of earlier ones.
fn stem_rules() -> &'static [StemRule] {
    static RULES: OnceLock<Vec<StemRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            StemRule {
                name: "magnitude",
                part: Part::Base,
                patterns: vec![(regex(r"-(xs|sm|md|lg|xl|[2-9]xl|base)$"), "-{size}")],
            },
            StemRule {
                name: "numeric",
                part: Part::Base,
                patterns: vec![
                    (regex(r"-\d+(\.\d+)?(/\d+)?$"), "-{n}"),
                    (regex(r"-\[[^\]]*\]$"), "-{n}"),
                ],
            },
            StemRule {
                name: "color",
                part: Part::Base,
                patterns: vec![(
                    regex(&format!(r"-({COLORS})(-\{{n\}})?$")),
                    "-{color}",
                )],
            },
            StemRule {
                name: "direction",
                part: Part::Base,
                patterns: vec![
                    (regex(r"^(-?[mp])[trblxyse]-"), "${1}{dir}-"),
                    (
                        regex(r"^(border|rounded|inset|scroll-[mp])-(tl|tr|bl|br|ss|se|es|ee|t|r|b|l|x|y|s|e)(-|$)"),
                        "${1}-{dir}${3}",
                    ),
                ],
            },
            StemRule {
                name: "state",
                part: Part::Variants,
                patterns: vec![(
                    regex(r"(^|:)(hover|focus|focus-visible|focus-within|active|visited|disabled|checked|group-hover|peer-hover|aria-[a-z-]+|data-\[[^\]]*\])(:)"),
                    "${1}{state}${3}",
                )],
            },
            StemRule {
                name: "axis",
                part: Part::Base,
                patterns: vec![(
                    regex(r"^(-?)(gap|space|overflow|scroll|translate|scale|skew|divide|snap)-(x|y)(-|$)"),
                    "${1}${2}-{axis}${4}",
                )],
            },
            StemRule {
                name: "sizing",
                part: Part::Base,
                patterns: vec![(
                    regex(r"^((min-|max-)?[wh]|size|basis)-(full|screen|auto|min|max|fit|px|svh|dvh|lvh|prose)$"),
                    "${1}-{sizing}",
                )],
            },
            StemRule {
                name: "border-style",
                part: Part::Base,
                patterns: vec![(
                    regex(r"^(border|outline|divide)-(solid|dashed|dotted|double|hidden|none)$"),
                    "${1}-{style}",
                )],
            },
        ]
    })
}

/// Names of the stemming rules in application order.
pub fn rule_names() -> Vec<&'static str> {
    stem_rules().iter().map(|r| r.name).collect()
}

/// Reduce one token by every rule in order.
pub fn stem_token(token: &str) -> String {
    let (mut variants, mut base) = match token.rfind(':') {
        Some(idx) => (token[..=idx].to_string(), token[idx + 1..].to_string()),
        None => (String::new(), token.to_string()),
    };

    for rule in stem_rules() {
        let target = match rule.part {
            Part::Base => &mut base,
            Part::Variants => &mut variants,
        };
        if target.is_empty() {
            continue;
        }
        for (re, replacement) in &rule.patterns {
            // state variants can repeat (`hover:focus:`)
            let mut current = target.clone();
            loop {
                let next = re.replace_all(&current, *replacement).into_owned();
                if next == current {
                    break;
                }
                current = next;
            }
            *target = current;
        }
    }

    format!("{variants}{base}")
}

/// One bucket per stemmed token with at least `min_markers` distinct markers,
/// most used first.
pub fn token_clusters(entries: &[ClassSetEntry], min_markers: usize) -> Vec<TokenCluster> {
    #[derive(Default)]
    struct Bucket {
        tokens: BTreeSet<String>,
        markers: BTreeSet<String>,
        occurrences: usize,
    }

    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    for entry in entries {
        for token in entry.class_set.iter() {
            let bucket = buckets.entry(stem_token(token)).or_default();
            bucket.tokens.insert(token.to_string());
            bucket.markers.insert(entry.marker.clone());
            bucket.occurrences += entry.locations.len().max(1);
        }
    }

    let mut clusters: Vec<TokenCluster> = buckets
        .into_iter()
        .filter(|(_, b)| b.markers.len() >= min_markers.max(2))
        .map(|(stem, b)| TokenCluster {
            stem,
            tokens: b.tokens.into_iter().collect(),
            markers: b.markers.into_iter().collect(),
            occurrences: b.occurrences,
        })
        .collect();

    clusters.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| b.markers.len().cmp(&a.markers.len()))
            .then_with(|| a.stem.cmp(&b.stem))
    });
    clusters
}

/// Markers whose full stemmed sets coincide although their canonical sets differ.
pub fn pattern_clusters(entries: &[ClassSetEntry], min_markers: usize) -> Vec<PatternCluster> {
    let mut groups: BTreeMap<Vec<String>, Vec<&ClassSetEntry>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.class_set.is_empty()) {
        let stems: BTreeSet<String> = entry.class_set.iter().map(stem_token).collect();
        groups
            .entry(stems.into_iter().collect())
            .or_default()
            .push(entry);
    }

    let mut clusters: Vec<PatternCluster> = groups
        .into_iter()
        .filter_map(|(stems, members)| {
            let markers: BTreeSet<String> = members.iter().map(|e| e.marker.clone()).collect();
            let canonicals: BTreeSet<String> =
                members.iter().map(|e| e.canonical.clone()).collect();
            if markers.len() < min_markers.max(2) || canonicals.len() < 2 {
                return None;
            }
            Some(PatternCluster {
                stems,
                markers: markers.into_iter().collect(),
                canonicals: canonicals.into_iter().collect(),
                occurrences: members.iter().map(|e| e.locations.len().max(1)).sum(),
            })
        })
        .collect();

    clusters.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.stems.cmp(&b.stems))
    });
    clusters
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

    #[test]
    fn test_rule_order() {
        assert_eq!(
            rule_names(),
            vec![
                "magnitude",
                "numeric",
                "color",
                "direction",
                "state",
                "axis",
                "sizing",
                "border-style"
            ]
        );
    }

    #[test]
    fn test_stem_tokens() {
        assert_eq!(stem_token("text-sm"), "text-{size}");
        assert_eq!(stem_token("rounded-2xl"), "rounded-{size}");
        assert_eq!(stem_token("gap-4"), "gap-{n}");
        assert_eq!(stem_token("w-[320px]"), "w-{n}");
        assert_eq!(stem_token("bg-red-500"), "bg-{color}");
        assert_eq!(stem_token("bg-red-500/50"), "bg-{color}");
        assert_eq!(stem_token("text-white"), "text-{color}");
        assert_eq!(stem_token("px-4"), "p{dir}-{n}");
        assert_eq!(stem_token("-mt-2"), "-m{dir}-{n}");
        assert_eq!(stem_token("border-t-2"), "border-{dir}-{n}");
        assert_eq!(stem_token("hover:bg-blue-600"), "{state}:bg-{color}");
        assert_eq!(stem_token("md:hover:focus:underline"), "md:{state}:{state}:underline");
        assert_eq!(stem_token("gap-x-2"), "gap-{axis}-{n}");
        assert_eq!(stem_token("overflow-y-auto"), "overflow-{axis}-auto");
        assert_eq!(stem_token("w-full"), "w-{sizing}");
        assert_eq!(stem_token("border-dashed"), "border-{style}");
        assert_eq!(stem_token("flex"), "flex");
    }

    #[test]
    fn test_token_clusters_ranked_by_occurrences() {
        let entries = vec![
            entry("a", "flex gap-2"),
            entry("b", "flex gap-4"),
            entry("c", "grid gap-6"),
            entry("d", "block"),
        ];
        let clusters = token_clusters(&entries, 2);
        assert_eq!(clusters[0].stem, "gap-{n}");
        assert_eq!(clusters[0].markers, vec!["a", "b", "c"]);
        assert_eq!(clusters[0].tokens, vec!["gap-2", "gap-4", "gap-6"]);
        assert_eq!(clusters[1].stem, "flex");
        assert!(clusters.iter().all(|c| c.stem != "block"));
    }

    #[test]
    fn test_pattern_clusters_need_different_sets() {
        let entries = vec![
            entry("card-a", "p-4 bg-white rounded-lg"),
            entry("card-b", "p-6 bg-gray-50 rounded-md"),
            entry("card-c", "p-6 bg-gray-50 rounded-md"),
            entry("btn", "px-2 text-sm"),
        ];
        let clusters = pattern_clusters(&entries, 2);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].markers, vec!["card-a", "card-b", "card-c"]);
        assert_eq!(clusters[0].canonicals.len(), 2);
        assert_eq!(clusters[0].stems, vec!["bg-{color}", "p-{n}", "rounded-{size}"]);
    }
}
