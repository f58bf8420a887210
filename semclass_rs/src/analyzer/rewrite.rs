//! Source rewriter.
//!
//! Rewriting never touches the syntax tree. The extractor already recorded byte
//! spans for the class value and the marker attribute; this module turns them into
//! an offset-keyed patch list and applies it to the original text in one pass.
//! Everything outside the patched ranges (other attributes, children, comments,
//! formatting) is copied through unchanged.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::types::{ByteSpan, ElementOccurrence};

/// Replace `source[start..end]` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Patch {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Patch {
    pub fn replace(span: ByteSpan, text: impl Into<String>) -> Self {
        Self {
            start: span.start as usize,
            end: span.end as usize,
            text: text.into(),
        }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: String::new(),
        }
    }
}

/// Patches for every mapped element of one file: class value → `"marker"`,
/// marker attribute (and the whitespace before it) → removed.
///
/// Elements without a class attribute are left alone even when they carry a
/// marker. The returned list is sorted and non-overlapping.
pub fn plan_patches(source: &str, occurrences: &[ElementOccurrence]) -> Vec<Patch> {
    let mut patches = Vec::new();

    for occ in occurrences.iter().filter(|occ| occ.is_mapped()) {
        let (Some(marker), Some(value), Some(marker_attr)) =
            (occ.marker_name(), occ.class_value_span, occ.marker_attr_span)
        else {
            continue;
        };
        patches.push(Patch::replace(value, quote_attribute(marker)));

        let end = marker_attr.end as usize;
        let start = leading_whitespace_start(source, marker_attr.start as usize);
        patches.push(Patch::delete(start, end));
    }

    patches.sort();
    let mut kept: Vec<Patch> = Vec::with_capacity(patches.len());
    for patch in patches {
        if let Some(prev) = kept.last()
            && patch.start < prev.end
        {
            debug!(
                "dropping overlapping patch at {}..{} (previous ends at {})",
                patch.start, patch.end, prev.end
            );
            continue;
        }
        kept.push(patch);
    }
    kept
}

/// Apply sorted, non-overlapping patches.
pub fn apply_patches(source: &str, patches: &[Patch]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for patch in patches {
        let start = patch.start.clamp(cursor, source.len());
        let end = patch.end.clamp(start, source.len());
        out.push_str(&source[cursor..start]);
        out.push_str(&patch.text);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Rewritten text, or `None` when the file has nothing to rewrite.
pub fn rewrite_source(source: &str, occurrences: &[ElementOccurrence]) -> Option<String> {
    let patches = plan_patches(source, occurrences);
    if patches.is_empty() {
        return None;
    }
    Some(apply_patches(source, &patches))
}

fn leading_whitespace_start(source: &str, offset: usize) -> usize {
    let head = &source[..offset.min(source.len())];
    let trimmed = head.trim_end_matches(char::is_whitespace);
    trimmed.len()
}

fn quote_attribute(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "&quot;"))
}

/// Re-export index per directory of rewritten files.
///
/// Input: rewritten sources relative to the output root. Output: `(dir, body)`
/// pairs where `dir` is `""` for the root. Directories that already contain a
/// rewritten `index.*` module get no generated index.
pub fn directory_indexes<'a>(
    rewritten: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<String, String> {
    let mut stems: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut has_own_index: BTreeSet<String> = BTreeSet::new();

    for rel in rewritten {
        let (dir, file) = rel.rsplit_once('/').unwrap_or(("", rel));
        let stem = match file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file,
        };
        if stem == "index" {
            has_own_index.insert(dir.to_string());
            continue;
        }
        stems
            .entry(dir.to_string())
            .or_default()
            .insert(stem.to_string());
    }

    stems
        .into_iter()
        .filter(|(dir, _)| !has_own_index.contains(dir))
        .map(|(dir, stems)| {
            let body: String = stems
                .iter()
                .map(|stem| format!("export * from \"./{stem}\";\n"))
                .collect();
            (dir, body)
        })
        .collect()
}
