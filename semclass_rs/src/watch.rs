//! Watch mode: regenerate artifacts as component files change.
//!
//! - Debounced notifications (100ms) from `notify-debouncer-full`
//! - The debouncer callback bumps a per-path generation counter, then queues the path
//! - One worker drains the queue, so at most one run per file is ever in flight
//! - A run whose generation moved on while it was working is discarded; the newer
//!   queued event produces the artifacts instead
//! - Only artifacts whose contents changed are rewritten
//!
//! Ctrl+C ends the process.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use notify::RecursiveMode;
use notify_debouncer_full::{DebounceEventResult, DebouncedEvent, new_debouncer};
use tracing::{debug, warn};

use crate::analyzer::runner::{Analysis, Artifact, Pipeline, RunReport, write_all};
use crate::fs_utils::relative_path;
use crate::progress::{format_count, format_duration};
use crate::types::{FileExtraction, FileFailure};

/// Watch configuration
pub struct WatchConfig {
    pub debounce_duration: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(100),
        }
    }
}

/// Per-path change counters shared between the debouncer callback and the worker.
#[derive(Debug, Default)]
pub struct Generations {
    inner: Mutex<HashMap<PathBuf, u64>>,
}

impl Generations {
    /// Record a new change to `path` and return its generation.
    pub fn bump(&self, path: &Path) -> u64 {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let generation = map.entry(path.to_path_buf()).or_insert(0);
        *generation += 1;
        *generation
    }

    /// True while no newer change to `path` has been recorded.
    pub fn is_current(&self, path: &Path, generation: u64) -> bool {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.get(path).copied().unwrap_or(0) == generation
    }
}

/// Outcome of reprocessing one changed path.
#[derive(Debug)]
pub enum FileChange {
    Processed(Box<FileExtraction>),
    Removed,
    Failed(FileFailure),
}

/// What one refresh touched on disk.
#[derive(Debug, Default)]
pub struct Refresh {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub write_errors: Vec<FileFailure>,
}

/// In-memory per-file state plus the last contents written for each artifact.
pub struct WatchSession {
    pipeline: Pipeline,
    extractions: BTreeMap<String, FileExtraction>,
    failures: BTreeMap<String, FileFailure>,
    written: BTreeMap<PathBuf, String>,
}

impl WatchSession {
    /// Full initial pass, every artifact written.
    pub fn start(pipeline: Pipeline) -> (Self, RunReport) {
        let analysis = pipeline.analyze();
        let artifacts = pipeline.plan_artifacts(&analysis.extractions, &analysis.store);
        let write_errors = write_all(pipeline.root(), &artifacts);

        let mut session = Self {
            extractions: analysis
                .extractions
                .iter()
                .map(|e| (e.relative.clone(), e.clone()))
                .collect(),
            failures: analysis
                .failures
                .iter()
                .map(|f| (f.path.clone(), f.clone()))
                .collect(),
            written: BTreeMap::new(),
            pipeline,
        };
        session.remember(&artifacts, &write_errors);
        let report = session
            .pipeline
            .report(analysis, artifacts, write_errors, false);
        (session, report)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Reprocess one path. Pure with respect to the session; apply with [`Self::apply`].
    pub fn process(&self, path: &Path) -> FileChange {
        if !path.exists() {
            return FileChange::Removed;
        }
        match self.pipeline.process_file(path) {
            Ok(extraction) => FileChange::Processed(Box::new(extraction)),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                FileChange::Failed(FileFailure {
                    path: relative_path(self.pipeline.root(), path),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Fold a change into the session and rewrite whatever artifacts it affects.
    ///
    /// A failed file keeps its last good extraction so its artifacts stay in place.
    pub fn apply(&mut self, path: &Path, change: FileChange) -> Refresh {
        let relative = relative_path(self.pipeline.root(), path);
        match change {
            FileChange::Processed(extraction) => {
                self.failures.remove(&relative);
                self.extractions.insert(relative, *extraction);
            }
            FileChange::Removed => {
                self.failures.remove(&relative);
                self.extractions.remove(&relative);
            }
            FileChange::Failed(failure) => {
                self.failures.insert(relative, failure);
            }
        }

        let (extractions, store) = self.merged();
        let artifacts = self.pipeline.plan_artifacts(&extractions, &store);

        let changed: Vec<Artifact> = artifacts
            .iter()
            .filter(|a| self.written.get(&a.path) != Some(&a.contents))
            .cloned()
            .collect();
        let write_errors = write_all(self.pipeline.root(), &changed);

        let planned: Vec<&PathBuf> = artifacts.iter().map(|a| &a.path).collect();
        let stale: Vec<PathBuf> = self
            .written
            .keys()
            .filter(|p| !planned.contains(p))
            .cloned()
            .collect();
        let mut removed = Vec::new();
        for path in stale {
            self.written.remove(&path);
            match std::fs::remove_file(&path) {
                Ok(()) => removed.push(path),
                Err(e) => debug!("Could not remove stale {}: {}", path.display(), e),
            }
        }

        self.remember(&changed, &write_errors);
        Refresh {
            written: changed
                .into_iter()
                .map(|a| a.path)
                .filter(|p| self.written.contains_key(p))
                .collect(),
            removed,
            write_errors,
        }
    }

    /// Report for the current in-memory state. Nothing is written.
    pub fn report(&self) -> RunReport {
        let (extractions, store) = self.merged();
        let artifacts = self.pipeline.plan_artifacts(&extractions, &store);
        let analysis = Analysis {
            extractions,
            failures: self.failures.values().cloned().collect(),
            store,
        };
        self.pipeline.report(analysis, artifacts, Vec::new(), false)
    }

    fn merged(&self) -> (Vec<FileExtraction>, crate::analyzer::MappingStore) {
        let extractions: Vec<FileExtraction> = self.extractions.values().cloned().collect();
        let store = Pipeline::reduce(&extractions);
        (extractions, store)
    }

    fn remember(&mut self, artifacts: &[Artifact], errors: &[FileFailure]) {
        let root = self.pipeline.root().to_path_buf();
        for artifact in artifacts {
            let rel = relative_path(&root, &artifact.path);
            if errors.iter().any(|e| e.path == rel) {
                self.written.remove(&artifact.path);
            } else {
                self.written
                    .insert(artifact.path.clone(), artifact.contents.clone());
            }
        }
    }
}

/// Run the initial pass, then regenerate on every change until interrupted.
///
/// `on_report` is called after the initial pass and after each applied change.
pub fn watch_and_regenerate(
    pipeline: Pipeline,
    config: WatchConfig,
    mut on_report: impl FnMut(&RunReport),
) -> anyhow::Result<()> {
    let root = pipeline.root().to_path_buf();
    let generations = Arc::new(Generations::default());
    let (tx, rx) = channel::<(PathBuf, u64)>();

    eprintln!("[watch] Initial scan...");
    let start = Instant::now();
    let (mut session, report) = WatchSession::start(pipeline);
    eprintln!(
        "[watch] ✓ {} in {}",
        format_count(report.summary.files_scanned, "file", "files"),
        format_duration(start.elapsed())
    );
    on_report(&report);

    let selector = session.pipeline().selector().clone();
    let callback_generations = Arc::clone(&generations);
    let mut debouncer = new_debouncer(
        config.debounce_duration,
        None,
        move |result: DebounceEventResult| match result {
            Ok(events) => {
                for path in changed_paths(&events) {
                    if !selector.matches(&path) {
                        continue;
                    }
                    let generation = callback_generations.bump(&path);
                    if let Err(e) = tx.send((path, generation)) {
                        eprintln!("[watch] Error sending event: {e}");
                    }
                }
            }
            Err(errors) => {
                for error in errors {
                    eprintln!("[watch] Error: {error}");
                }
            }
        },
    )
    .context("failed to start file watcher")?;

    debouncer
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", root.display()))?;

    let timestamp = chrono::Local::now().format("%H:%M:%S");
    eprintln!("[{}] Watching {}...", timestamp, root.display());
    eprintln!("[watch] Press Ctrl+C to exit");

    for (path, generation) in rx {
        if !generations.is_current(&path, generation) {
            debug!("{} superseded before start", path.display());
            continue;
        }

        let start = Instant::now();
        let change = session.process(&path);
        if !generations.is_current(&path, generation) {
            debug!("{} changed while processing; discarding result", path.display());
            continue;
        }

        let refresh = session.apply(&path, change);
        eprintln!(
            "[{}] {} → {} written, {} removed in {}",
            chrono::Local::now().format("%H:%M:%S"),
            relative_path(&root, &path),
            format_count(refresh.written.len(), "artifact", "artifacts"),
            refresh.removed.len(),
            format_duration(start.elapsed())
        );
        on_report(&session.report());
    }

    Ok(())
}

/// Distinct file paths from a batch of debounced events
fn changed_paths(events: &[DebouncedEvent]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = events
        .iter()
        .flat_map(|event| event.paths.iter())
        .filter(|path| !path.is_dir())
        .cloned()
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SemclassConfig;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn session(root: &Path) -> WatchSession {
        let pipeline = Pipeline::new(root, SemclassConfig::default(), "src/**/*.tsx").unwrap();
        WatchSession::start(pipeline).0
    }

    #[test]
    fn test_watch_config_default_debounce() {
        assert_eq!(
            WatchConfig::default().debounce_duration,
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_generations_supersede() {
        let generations = Generations::default();
        let path = Path::new("src/A.tsx");
        let first = generations.bump(path);
        assert!(generations.is_current(path, first));
        let second = generations.bump(path);
        assert!(!generations.is_current(path, first));
        assert!(generations.is_current(path, second));
        assert!(generations.is_current(Path::new("src/B.tsx"), 0));
    }

    #[test]
    fn test_only_changed_artifacts_rewritten() {
        let temp = TempDir::new().unwrap();
        let a = write(
            temp.path(),
            "src/A.tsx",
            r#"export const A = () => <div className="p-4" data-semantic="a" />;"#,
        );
        write(
            temp.path(),
            "src/B.tsx",
            r#"export const B = () => <div className="m-2" data-semantic="b" />;"#,
        );
        let mut session = session(temp.path());

        write(
            temp.path(),
            "src/A.tsx",
            r#"export const A = () => <div className="p-8" data-semantic="a" />;"#,
        );
        let change = session.process(&a);
        let refresh = session.apply(&a, change);

        let written: Vec<String> = refresh
            .written
            .iter()
            .map(|p| relative_path(temp.path(), p))
            .collect();
        assert_eq!(written, vec!["generated/css/src/A.css"]);
        let css = fs::read_to_string(temp.path().join("generated/css/src/A.css")).unwrap();
        assert!(css.contains("@apply p-8;"));
    }

    #[test]
    fn test_removed_file_drops_its_artifacts() {
        let temp = TempDir::new().unwrap();
        let a = write(
            temp.path(),
            "src/A.tsx",
            r#"export const A = () => <div className="p-4" data-semantic="a" />;"#,
        );
        write(
            temp.path(),
            "src/B.tsx",
            r#"export const B = () => <div className="m-2" data-semantic="b" />;"#,
        );
        let mut session = session(temp.path());

        fs::remove_file(&a).unwrap();
        let change = session.process(&a);
        assert!(matches!(change, FileChange::Removed));
        let refresh = session.apply(&a, change);

        assert!(!temp.path().join("generated/css/src/A.css").exists());
        assert!(!temp.path().join("generated/components/src/A.tsx").exists());
        assert!(!refresh.removed.is_empty());
        let index = fs::read_to_string(temp.path().join("generated/css/index.css")).unwrap();
        assert!(!index.contains("A.css"));
        assert!(index.contains("B.css"));
        assert_eq!(session.report().summary.mappings, 1);
    }

    #[test]
    fn test_parse_failure_keeps_last_good_state() {
        let temp = TempDir::new().unwrap();
        let a = write(
            temp.path(),
            "src/A.tsx",
            r#"export const A = () => <div className="p-4" data-semantic="a" />;"#,
        );
        let mut session = session(temp.path());

        write(temp.path(), "src/A.tsx", "export const A = () => <div className=>;");
        let change = session.process(&a);
        assert!(matches!(change, FileChange::Failed(_)));
        session.apply(&a, change);

        assert!(temp.path().join("generated/css/src/A.css").exists());
        let report = session.report();
        assert_eq!(report.summary.files_failed, 1);
        assert_eq!(report.summary.mappings, 1);
    }
}
