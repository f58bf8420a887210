//! Terminal output for the duplicate/similarity report.

use super::types::{DuplicateReport, SimilarityPair};

const TOP_CLUSTERS: usize = 10;

fn format_pair(pair: &SimilarityPair) -> Vec<String> {
    let mut lines = Vec::new();
    let metric = match pair.distance {
        Some(d) => format!("distance {} ({:.2})", d, pair.score),
        None => format!("{:.2}", pair.score),
    };
    lines.push(format!(
        "  {} <-> {}  {}",
        pair.left.marker, pair.right.marker, metric
    ));
    if !pair.shared.is_empty() {
        lines.push(format!("      shared: {}", pair.shared.join(" ")));
    }
    if !pair.left_only.is_empty() {
        lines.push(format!("      only {}: {}", pair.left.marker, pair.left_only.join(" ")));
    }
    if !pair.right_only.is_empty() {
        lines.push(format!(
            "      only {}: {}",
            pair.right.marker,
            pair.right_only.join(" ")
        ));
    }
    lines
}

fn pair_section(lines: &mut Vec<String>, title: &str, pairs: &[SimilarityPair]) {
    if pairs.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{} ({}):", title, pairs.len()));
    for pair in pairs {
        lines.extend(format_pair(pair));
    }
}

/// Human-readable report. `verbose` lists every cluster instead of the top ten.
pub fn format_report(report: &DuplicateReport, verbose: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Class set analysis: {} distinct set(s)",
        report.total_sets
    ));

    if report.is_empty() {
        lines.push("No duplicates or similar class sets found.".to_string());
        return lines.join("\n") + "\n";
    }

    if !report.exact.is_empty() {
        lines.push(String::new());
        lines.push(format!("Exact duplicates ({}):", report.exact.len()));
        for group in &report.exact {
            lines.push(format!("  [{}]", group.canonical));
            lines.push(format!("      markers: {}", group.markers.join(", ")));
        }
    }

    pair_section(&mut lines, "Jaccard", &report.jaccard);
    pair_section(&mut lines, "Dice", &report.dice);
    pair_section(&mut lines, "Levenshtein", &report.levenshtein);

    let limit = if verbose { usize::MAX } else { TOP_CLUSTERS };
    if !report.token_clusters.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "Recurring utilities ({}):",
            report.token_clusters.len()
        ));
        for cluster in report.token_clusters.iter().take(limit) {
            lines.push(format!(
                "  {}  x{}  [{}]",
                cluster.stem,
                cluster.occurrences,
                cluster.markers.join(", ")
            ));
        }
    }

    if !report.pattern_clusters.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "Recurring combinations ({}):",
            report.pattern_clusters.len()
        ));
        for cluster in report.pattern_clusters.iter().take(limit) {
            lines.push(format!(
                "  {}  x{}",
                cluster.stems.join(" "),
                cluster.occurrences
            ));
            lines.push(format!("      markers: {}", cluster.markers.join(", ")));
        }
    }

    lines.join("\n") + "\n"
}
