//! Common types shared by the pipeline stages.
//!
//! Everything here is plain owned data: per-file work produces these records,
//! the parsed tree itself never leaves the function that parsed it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analyzer::normalize::ClassSet;

/// Byte range into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteSpan {
    pub start: u32,
    pub end: u32,
}

impl ByteSpan {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<oxc_span::Span> for ByteSpan {
    fn from(span: oxc_span::Span) -> Self {
        Self::new(span.start, span.end)
    }
}

/// Syntactic form of the class attribute value, as classified by the handler chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassExprKind {
    /// `className="a b"` or `className={"a b"}`
    Literal,
    /// `className={cn("a", cond && "b")}`
    MergeCall,
    /// ``className={`a ${x} b`}``
    Template,
    /// Anything else: identifiers, conditionals, member access
    Dynamic,
    /// No class attribute on the element
    Absent,
}

impl ClassExprKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::MergeCall => "merge_call",
            Self::Template => "template",
            Self::Dynamic => "dynamic",
            Self::Absent => "absent",
        }
    }
}

/// Marker attribute as found on an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MarkerValue {
    /// Literal string value
    Literal(String),
    /// Present, but not a literal (identifier, expression) - node is ignored
    NonLiteral,
    /// No marker attribute
    Absent,
}

impl MarkerValue {
    pub fn literal(&self) -> Option<&str> {
        match self {
            Self::Literal(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Source position of an occurrence (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One JSX element carrying a class attribute and/or a marker attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementOccurrence {
    /// Element name as written (`div`, `Card.Header`)
    pub tag: String,
    pub location: Location,
    pub class_kind: ClassExprKind,
    /// Static text recovered from the class expression (may be empty)
    pub class_raw: String,
    /// Tokens of `class_raw` in declaration order, deduplicated
    pub declared_tokens: Vec<String>,
    pub class_set: ClassSet,
    pub marker: MarkerValue,
    /// Whole `className=...` attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_attr_span: Option<ByteSpan>,
    /// Only the value part of the class attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_value_span: Option<ByteSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_attr_span: Option<ByteSpan>,
}

impl ElementOccurrence {
    /// Literal, non-empty marker name, if any.
    pub fn marker_name(&self) -> Option<&str> {
        self.marker.literal().filter(|name| !name.trim().is_empty())
    }

    /// Element contributes a mapping: a marker usable as a CSS class name plus a
    /// non-empty class set.
    pub fn is_mapped(&self) -> bool {
        self.marker_name().is_some_and(is_class_name) && !self.class_set.is_empty()
    }

    /// Literal marker that cannot be emitted as a class selector.
    pub fn invalid_marker(&self) -> Option<&str> {
        self.marker_name().filter(|name| !is_class_name(name))
    }
}

/// CSS identifier usable unescaped as `.name` and as a `class` token:
/// optional `-`, then a letter, `_`, `-` or non-ASCII, then those plus digits.
pub fn is_class_name(name: &str) -> bool {
    let allowed = |c: char| c == '_' || c == '-' || c.is_ascii_alphanumeric() || !c.is_ascii();
    let body = name.strip_prefix('-').unwrap_or(name);
    let mut chars = body.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    !first.is_ascii_digit()
        && allowed(first)
        && !body.chars().any(char::is_whitespace)
        && chars.all(allowed)
}

/// Element with literal classes but no marker attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingMarker {
    pub tag: String,
    pub location: Location,
    pub class_set: ClassSet,
    pub suggested: String,
}

/// Pure result of processing one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileExtraction {
    #[serde(skip)]
    pub path: PathBuf,
    /// Path relative to the project root, `/`-separated
    pub relative: String,
    pub occurrences: Vec<ElementOccurrence>,
    pub missing_markers: Vec<MissingMarker>,
    /// Rewritten source text, `None` when nothing in the file is mapped
    #[serde(skip)]
    pub rewritten: Option<String>,
}

impl FileExtraction {
    pub fn new(path: PathBuf, relative: String) -> Self {
        Self {
            path,
            relative,
            ..Default::default()
        }
    }

    pub fn mapped(&self) -> impl Iterator<Item = &ElementOccurrence> {
        self.occurrences.iter().filter(|occ| occ.is_mapped())
    }

    pub fn has_mappings(&self) -> bool {
        self.mapped().next().is_some()
    }
}

/// Per-file failure, logged and skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub message: String,
}

/// Counters printed at the end of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub files_failed: usize,
    pub mappings: usize,
    pub rules_written: usize,
    pub css_files_written: usize,
    pub sources_written: usize,
    pub missing_markers: usize,
    pub conflicts: usize,
    pub failures: Vec<FileFailure>,
    /// Artifact writes that failed (run continues, outputs may be inconsistent)
    pub write_errors: Vec<FileFailure>,
}

/// Compute 1-indexed (line, column) for a byte offset.
pub fn offset_to_location(source: &str, offset: usize) -> (usize, usize) {
    let capped = offset.min(source.len());
    let before = &source.as_bytes()[..capped];
    let line = before.iter().filter(|b| **b == b'\n').count() + 1;
    let last_newline = before
        .iter()
        .rposition(|b| *b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line, capped - last_newline + 1)
}
