//! Configuration file support for semclass.
//!
//! Loads optional `semclass.toml` from the project root. Every key has a default,
//! so a missing or broken file never stops a run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, SemclassError};

pub const CONFIG_FILE_NAME: &str = "semclass.toml";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SemclassConfig {
    /// Glob selecting component files, relative to the project root
    pub pattern: Option<String>,
    /// Named globs selectable with `--category`
    pub categories: BTreeMap<String, String>,
    /// Attribute whose literal value names the generated rule
    pub marker_attribute: String,
    /// Class attribute names, first present wins
    pub class_attributes: Vec<String>,
    /// Callee names treated as class-merging helpers (`cn(...)`, `clsx(...)`)
    pub merge_helpers: Vec<String>,
    /// Directive used in generated rule bodies
    pub apply_directive: String,
    pub css_out: PathBuf,
    pub source_out: PathBuf,
    pub index_file: String,
    /// Structural tokens skipped when suggesting a marker name
    pub spacing_denylist: Vec<String>,
    pub similarity: SimilarityConfig,
    pub content: ContentConfig,
}

impl Default for SemclassConfig {
    fn default() -> Self {
        Self {
            pattern: None,
            categories: BTreeMap::new(),
            marker_attribute: "data-semantic".to_string(),
            class_attributes: vec!["className".to_string(), "class".to_string()],
            merge_helpers: [
                "cn",
                "clsx",
                "classNames",
                "classnames",
                "cx",
                "twMerge",
                "merge",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            apply_directive: "@apply".to_string(),
            css_out: PathBuf::from("generated/css"),
            source_out: PathBuf::from("generated/components"),
            index_file: "index.css".to_string(),
            spacing_denylist: default_spacing_denylist(),
            similarity: SimilarityConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

fn default_spacing_denylist() -> Vec<String> {
    [
        r"^-?[mp][trblxyse]?-",
        r"^-?(gap|gap-x|gap-y)-",
        r"^-?space-[xy]-",
        r"^(w|h|size|min-w|min-h|max-w|max-h)-",
        r"^inset(-[xy])?-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Thresholds for the duplicate/similarity report
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Minimum Jaccard/Dice score reported
    pub threshold: f64,
    /// Maximum Levenshtein distance reported
    pub max_distance: usize,
    pub max_pairs: usize,
    pub min_cluster_size: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            max_distance: 3,
            max_pairs: 50,
            min_cluster_size: 2,
        }
    }
}

/// Secondary (content/sample) pipeline settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Call forms: `defineSample({ type, variant, data })`
    pub sample_callees: Vec<String>,
    /// JSX forms: `<Block type=".." variant=".." data={..} />`
    pub sample_components: Vec<String>,
    pub embedding_model: String,
    pub out: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            sample_callees: vec!["defineSample".to_string(), "sample".to_string()],
            sample_components: vec!["Block".to_string(), "Sample".to_string()],
            embedding_model: "text-embedding-3-small".to_string(),
            out: PathBuf::from("generated/content"),
        }
    }
}

impl SemclassConfig {
    /// Load config from `semclass.toml` in the given root directory.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        Self::load_from_path(&root.join(CONFIG_FILE_NAME))
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Resolve the input glob: explicit pattern, then category, then config `pattern`.
    ///
    /// This is checked before any file is read, so a missing pattern is the one
    /// error that ends the process with a non-zero status.
    pub fn resolve_pattern(
        &self,
        pattern: Option<&str>,
        category: Option<&str>,
    ) -> Result<String> {
        if let Some(p) = pattern.filter(|p| !p.trim().is_empty()) {
            return Ok(p.to_string());
        }
        if let Some(cat) = category {
            return self
                .categories
                .get(cat)
                .cloned()
                .ok_or_else(|| SemclassError::UnknownCategory(cat.to_string()));
        }
        self.pattern
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or(SemclassError::MissingPattern)
    }

    /// Resolve an output directory against the project root.
    pub fn resolve_out(root: &Path, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        }
    }
}
