//! Filesystem utilities: glob-based source selection and artifact writes.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};
use walkdir::WalkDir;

use crate::error::{Result, SemclassError};

/// Directories never descended into when walking a project root.
const SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", ".next", "target"];

/// Compiled input selector: a root directory plus a glob relative to it.
#[derive(Debug, Clone)]
pub struct SourceSelector {
    root: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
    /// Output roots inside the project are excluded so regenerated files are not re-read
    excluded: Vec<PathBuf>,
}

impl SourceSelector {
    pub fn new(root: &Path, pattern: &str) -> Result<Self> {
        let glob = Glob::new(pattern).map_err(|source| SemclassError::Glob {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
            excluded: Vec::new(),
        })
    }

    pub fn excluding(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.excluded.extend(dirs);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Does a path (absolute or root-relative) match the selector?
    pub fn matches(&self, path: &Path) -> bool {
        if self.excluded.iter().any(|dir| path.starts_with(dir)) {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.matcher.is_match(relative)
    }

    /// Enumerate matching files, sorted for reproducible output.
    pub fn gather(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| SKIP_DIRS.contains(&name)))
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.matches(path))
            .collect();
        files.sort();
        files
    }
}

/// Root-relative, `/`-separated path string.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whole-file overwrite, creating parent directories on demand.
/// Drop `.` components and fold `..` into their parent, without touching disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Module specifier for `target` as seen from a file in `from_dir`:
/// `/`-separated, always starting with `./` or `../`.
pub fn module_specifier(from_dir: &Path, target: &Path) -> String {
    let from = normalize_path(from_dir);
    let to = normalize_path(target);
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let ups = from.len() - common;
    let mut parts: Vec<String> = if ups == 0 {
        vec![".".to_string()]
    } else {
        vec!["..".to_string(); ups]
    };
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SemclassError::io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| SemclassError::io(path, e))
}

pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| SemclassError::io(path, e))
}
