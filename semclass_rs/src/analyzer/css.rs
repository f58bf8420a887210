//! CSS synthesis: one `@apply` rule per marker, one sheet per source file,
//! one index importing every sheet.
//!
//! Output is fully deterministic: rules are ordered by marker, index imports by
//! path. Identical inputs give byte-identical files.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::mapping::MappingStore;
use super::normalize::ClassSet;
use crate::types::FileExtraction;

/// `.{marker} { @apply tokens...; }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssRule {
    pub marker: String,
    pub class_set: ClassSet,
}

impl CssRule {
    pub fn new(marker: impl Into<String>, class_set: ClassSet) -> Option<Self> {
        if class_set.is_empty() {
            return None;
        }
        Some(Self {
            marker: marker.into(),
            class_set,
        })
    }

    pub fn selector(&self) -> String {
        format!(".{}", self.marker)
    }

    /// Tokens after the directive, canonical order.
    pub fn directive_body(&self) -> String {
        self.class_set.canonical()
    }

    pub fn render(&self, apply_directive: &str) -> String {
        format!(
            "{} {{\n  {} {};\n}}\n",
            self.selector(),
            apply_directive,
            self.directive_body()
        )
    }
}

/// Generated sheet for one component file.
#[derive(Debug, Clone, Serialize)]
pub struct StyleSheet {
    /// Source the rules came from (`src/ui/Card.tsx`)
    pub source: String,
    /// Sheet path relative to the CSS output root (`src/ui/Card.css`)
    pub relative: String,
    pub rules: Vec<CssRule>,
}

impl StyleSheet {
    /// Rules for every marker mapped in `extraction`, bodies taken from the merged
    /// store. `None` when the file maps nothing.
    pub fn for_file(extraction: &FileExtraction, store: &MappingStore) -> Option<Self> {
        let markers: BTreeSet<&str> = extraction
            .mapped()
            .filter_map(|occ| occ.marker_name())
            .collect();

        let rules: Vec<CssRule> = markers
            .into_iter()
            .filter_map(|marker| {
                let set = store.effective(marker)?.clone();
                CssRule::new(marker, set)
            })
            .collect();

        if rules.is_empty() {
            return None;
        }

        Some(Self {
            source: extraction.relative.clone(),
            relative: css_relative_path(&extraction.relative),
            rules,
        })
    }

    pub fn render(&self, apply_directive: &str) -> String {
        let mut out = format!(
            "/* Generated by semclass from {}. Do not edit by hand. */\n",
            self.source
        );
        for rule in &self.rules {
            out.push('\n');
            out.push_str(&rule.render(apply_directive));
        }
        out
    }
}

/// `src/ui/Card.tsx` → `src/ui/Card.css`
pub fn css_relative_path(source_relative: &str) -> String {
    match source_relative.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.is_empty() => format!("{stem}.css"),
        _ => format!("{source_relative}.css"),
    }
}

/// Sheet path for each source, keyed by source path.
///
/// Normally `css_relative_path`. Sources that would share a sheet (`Card.tsx` and
/// `Card.jsx`), or whose sheet would land on `reserved` (the index file), keep
/// their extension instead (`Card.tsx.css`).
pub fn assign_sheet_paths<'a>(
    sources: impl IntoIterator<Item = &'a str>,
    reserved: &str,
) -> BTreeMap<String, String> {
    let sources: BTreeSet<&str> = sources.into_iter().collect();
    let mut extended: BTreeSet<&str> = BTreeSet::new();
    loop {
        let path_of = |source: &str| {
            if extended.contains(source) {
                format!("{source}.css")
            } else {
                css_relative_path(source)
            }
        };
        let mut claims: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for &source in &sources {
            claims.entry(path_of(source)).or_default().push(source);
        }
        let clashing: Vec<&str> = claims
            .iter()
            .filter(|(path, owners)| owners.len() > 1 || path.as_str() == reserved)
            .flat_map(|(_, owners)| owners.iter().copied())
            .filter(|source| !extended.contains(source))
            .collect();
        if clashing.is_empty() {
            return sources
                .iter()
                .map(|&source| (source.to_string(), path_of(source)))
                .collect();
        }
        extended.extend(clashing);
    }
}

/// Index file body: one `@import` per sheet, sorted, duplicates removed.
pub fn render_index<'a>(sheets: impl IntoIterator<Item = &'a str>) -> String {
    let sorted: BTreeSet<&str> = sheets.into_iter().collect();
    let mut out = String::from("/* Generated by semclass. Do not edit by hand. */\n");
    for rel in sorted {
        out.push_str(&format!("@import \"./{rel}\";\n"));
    }
    out
}
