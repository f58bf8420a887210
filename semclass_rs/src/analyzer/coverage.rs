//! Marker coverage: elements with recoverable classes but no marker attribute.
//!
//! The verdict depends only on the marker: an element with a literal marker is
//! never reported, whatever its classes. Elements whose class expression produced
//! nothing (fully dynamic) and elements with a non-literal marker are not
//! reported either.

use regex::Regex;
use tracing::warn;

use crate::config::SemclassConfig;
use crate::types::{ElementOccurrence, MarkerValue, MissingMarker};

pub struct CoverageValidator {
    denylist: Vec<Regex>,
}

impl CoverageValidator {
    /// Invalid patterns are logged and skipped.
    pub fn new<S: AsRef<str>>(patterns: impl IntoIterator<Item = S>) -> Self {
        let denylist = patterns
            .into_iter()
            .filter_map(|p| match Regex::new(p.as_ref()) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Ignoring invalid spacing_denylist entry `{}`: {}", p.as_ref(), e);
                    None
                }
            })
            .collect();
        Self { denylist }
    }

    pub fn from_config(config: &SemclassConfig) -> Self {
        Self::new(&config.spacing_denylist)
    }

    fn is_structural(&self, token: &str) -> bool {
        self.denylist.iter().any(|re| re.is_match(token))
    }

    /// `{tag}-{first meaningful token}`, or `{tag}-container`.
    pub fn suggest_name(&self, tag: &str, declared_tokens: &[String]) -> String {
        let tag = sanitize(tag);
        let tag = if tag.is_empty() { "element".to_string() } else { tag };

        declared_tokens
            .iter()
            .map(|token| strip_variants(token))
            .filter(|token| !self.is_structural(token))
            .map(sanitize)
            .find(|token| !token.is_empty())
            .map(|token| format!("{tag}-{token}"))
            .unwrap_or_else(|| format!("{tag}-container"))
    }

    pub fn check(&self, occurrences: &[ElementOccurrence]) -> Vec<MissingMarker> {
        occurrences
            .iter()
            .filter(|occ| occ.marker == MarkerValue::Absent && !occ.class_set.is_empty())
            .map(|occ| MissingMarker {
                tag: occ.tag.clone(),
                location: occ.location.clone(),
                class_set: occ.class_set.clone(),
                suggested: self.suggest_name(&occ.tag, &occ.declared_tokens),
            })
            .collect()
    }
}

impl Default for CoverageValidator {
    fn default() -> Self {
        Self::from_config(&SemclassConfig::default())
    }
}

/// `md:hover:!px-4` → `px-4`
fn strip_variants(token: &str) -> &str {
    let base = token.rsplit(':').next().unwrap_or(token);
    base.trim_start_matches('!')
}

/// Lowercase `[a-z0-9-]`, single dashes, no dashes at the ends.
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}
