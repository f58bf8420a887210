//! Batch orchestration: walk, per-file work in parallel, reduce, write artifacts.
//!
//! Per-file work ([`Pipeline::process_file`]) reads only its own file and returns
//! an owned [`FileExtraction`]; the rayon pool runs it without shared state. The
//! reduce step ([`Pipeline::reduce`]) is the only place results meet.
//!
//! # Artifact consistency
//!
//! Artifacts are written one file at a time as whole-file overwrites. The set is
//! not written atomically: a crash or a failed write halfway through can leave
//! stylesheets, rewritten sources and the indexes out of step with each other.
//! Failed writes are collected in [`RunSummary::write_errors`] and logged; the
//! next full run regenerates everything.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::coverage::CoverageValidator;
use super::crowd::{self, DuplicateReport};
use super::css::{StyleSheet, assign_sheet_paths, render_index};
use super::jsx::AttributeExtractor;
use super::mapping::{MappingStore, MarkerConflict};
use super::rewrite::{directory_indexes, rewrite_source};
use crate::analyzer::content::{self, Document, FileSamples};
use crate::config::SemclassConfig;
use crate::error::Result;
use crate::fs_utils::{SourceSelector, read_source, relative_path, write_artifact};
use crate::types::{FileExtraction, FileFailure, MissingMarker, RunSummary};

/// Name of the per-directory re-export module next to rewritten sources.
pub const SOURCE_INDEX_FILE: &str = "index.ts";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Stylesheet,
    StylesheetIndex,
    Source,
    SourceIndex,
    Documents,
    Samples,
}

/// One output file, fully rendered before anything is written.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    #[serde(skip)]
    pub contents: String,
}

/// Result of the analysis half of a run (no writes).
#[derive(Debug, Default)]
pub struct Analysis {
    /// Sorted by relative path
    pub extractions: Vec<FileExtraction>,
    pub failures: Vec<FileFailure>,
    pub store: MappingStore,
}

impl Analysis {
    pub fn missing_markers(&self) -> Vec<MissingMarker> {
        self.extractions
            .iter()
            .flat_map(|e| e.missing_markers.iter().cloned())
            .collect()
    }
}

/// Everything a full run produced.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub missing_markers: Vec<MissingMarker>,
    pub conflicts: Vec<MarkerConflict>,
    pub duplicates: DuplicateReport,
    pub artifacts: Vec<Artifact>,
    pub dry_run: bool,
}

/// Configured pipeline for one project root and one input pattern.
pub struct Pipeline {
    root: PathBuf,
    config: SemclassConfig,
    selector: SourceSelector,
    extractor: AttributeExtractor,
    validator: CoverageValidator,
    css_out: PathBuf,
    source_out: PathBuf,
}

impl Pipeline {
    pub fn new(root: &Path, config: SemclassConfig, pattern: &str) -> Result<Self> {
        let css_out = SemclassConfig::resolve_out(root, &config.css_out);
        let source_out = SemclassConfig::resolve_out(root, &config.source_out);
        let content_out = SemclassConfig::resolve_out(root, &config.content.out);
        let selector = SourceSelector::new(root, pattern)?.excluding([
            css_out.clone(),
            source_out.clone(),
            content_out,
        ]);
        Ok(Self {
            root: root.to_path_buf(),
            extractor: AttributeExtractor::from_config(&config),
            validator: CoverageValidator::from_config(&config),
            config,
            selector,
            css_out,
            source_out,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SemclassConfig {
        &self.config
    }

    pub fn selector(&self) -> &SourceSelector {
        &self.selector
    }

    /// Pure per-file step: extract, validate coverage, plan the rewrite.
    pub fn process_file(&self, path: &Path) -> Result<FileExtraction> {
        let relative = relative_path(&self.root, path);
        let source = read_source(path)?;
        let occurrences = self.extractor.extract_source(&source, path, &relative)?;
        for occ in &occurrences {
            if let Some(marker) = occ.invalid_marker() {
                warn!(
                    "{}: marker `{}` is not a valid CSS class name, element left unchanged",
                    occ.location, marker
                );
            }
        }

        let mut extraction = FileExtraction::new(path.to_path_buf(), relative);
        extraction.missing_markers = self.validator.check(&occurrences);
        extraction.rewritten = rewrite_source(&source, &occurrences);
        extraction.occurrences = occurrences;
        debug!(
            "{}: {} element(s), {} mapped",
            extraction.relative,
            extraction.occurrences.len(),
            extraction.mapped().count()
        );
        Ok(extraction)
    }

    /// Process files in parallel. Failures are logged and returned, never fatal.
    pub fn process_all(&self, files: &[PathBuf]) -> (Vec<FileExtraction>, Vec<FileFailure>) {
        let results: Vec<(PathBuf, Result<FileExtraction>)> = files
            .par_iter()
            .map(|path| (path.clone(), self.process_file(path)))
            .collect();

        let mut extractions = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (path, result) in results {
            match result {
                Ok(extraction) => extractions.push(extraction),
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    failures.push(FileFailure {
                        path: relative_path(&self.root, &path),
                        message: e.to_string(),
                    });
                }
            }
        }
        extractions.sort_by(|a, b| a.relative.cmp(&b.relative));
        (extractions, failures)
    }

    /// Order-independent merge of per-file stores. Conflicts are logged, not fatal.
    pub fn reduce(extractions: &[FileExtraction]) -> MappingStore {
        let store = MappingStore::merge_all(extractions.iter().map(MappingStore::from_file));
        for conflict in store.conflicts() {
            let sites: Vec<String> = conflict
                .variants
                .iter()
                .map(|v| {
                    let first = v
                        .locations
                        .first()
                        .map(|l| l.to_string())
                        .unwrap_or_default();
                    format!("[{}] at {}", v.class_set, first)
                })
                .collect();
            warn!(
                "Marker `{}` used with {} different class sets, using [{}]: {}",
                conflict.marker,
                conflict.variants.len(),
                conflict.effective,
                sites.join("; ")
            );
        }
        store
    }

    /// Walk, process, reduce. No writes.
    pub fn analyze(&self) -> Analysis {
        let files = self.selector.gather();
        info!(
            "Scanning {} file(s) matching `{}`",
            files.len(),
            self.selector.pattern()
        );
        let (extractions, failures) = self.process_all(&files);
        let store = Self::reduce(&extractions);
        Analysis {
            extractions,
            failures,
            store,
        }
    }

    pub fn duplicates(&self, store: &MappingStore) -> DuplicateReport {
        crowd::analyze(&store.distinct_sets(), &self.config.similarity)
    }

    /// Render every artifact of a full run.
    pub fn plan_artifacts(
        &self,
        extractions: &[FileExtraction],
        store: &MappingStore,
    ) -> Vec<Artifact> {
        let mut artifacts = Vec::new();
        let mut sheets: Vec<StyleSheet> = extractions
            .iter()
            .filter_map(|extraction| StyleSheet::for_file(extraction, store))
            .collect();
        let paths = assign_sheet_paths(
            sheets.iter().map(|sheet| sheet.source.as_str()),
            &self.config.index_file,
        );

        for sheet in &mut sheets {
            if let Some(path) = paths.get(&sheet.source) {
                sheet.relative = path.clone();
            }
            artifacts.push(Artifact {
                kind: ArtifactKind::Stylesheet,
                path: self.css_out.join(&sheet.relative),
                contents: sheet.render(&self.config.apply_directive),
            });
        }
        artifacts.push(Artifact {
            kind: ArtifactKind::StylesheetIndex,
            path: self.css_out.join(&self.config.index_file),
            contents: render_index(sheets.iter().map(|sheet| sheet.relative.as_str())),
        });

        let mut rewritten: Vec<&str> = Vec::new();
        for extraction in extractions {
            if let Some(text) = &extraction.rewritten {
                artifacts.push(Artifact {
                    kind: ArtifactKind::Source,
                    path: self.source_out.join(&extraction.relative),
                    contents: text.clone(),
                });
                rewritten.push(&extraction.relative);
            }
        }
        for (dir, body) in directory_indexes(rewritten) {
            let dir_path = if dir.is_empty() {
                self.source_out.clone()
            } else {
                self.source_out.join(&dir)
            };
            artifacts.push(Artifact {
                kind: ArtifactKind::SourceIndex,
                path: dir_path.join(SOURCE_INDEX_FILE),
                contents: body,
            });
        }

        artifacts
    }

    /// Full run: analyze, plan, write (unless dry-run), summarize.
    pub fn run(&self, options: &RunOptions) -> RunReport {
        let analysis = self.analyze();
        let artifacts = self.plan_artifacts(&analysis.extractions, &analysis.store);

        let write_errors = if options.dry_run {
            Vec::new()
        } else {
            write_all(&self.root, &artifacts)
        };

        let report = self.report(analysis, artifacts, write_errors, options.dry_run);
        info!(
            "{} mapping(s), {} stylesheet(s), {} rewritten source(s){}",
            report.summary.mappings,
            report.summary.css_files_written,
            report.summary.sources_written,
            if options.dry_run { " (dry run)" } else { "" }
        );
        report
    }

    /// Summaries, coverage, conflicts and duplicates for an analyzed tree.
    pub fn report(
        &self,
        analysis: Analysis,
        artifacts: Vec<Artifact>,
        write_errors: Vec<FileFailure>,
        dry_run: bool,
    ) -> RunReport {
        let duplicates = self.duplicates(&analysis.store);
        let conflicts = analysis.store.conflicts();
        let missing_markers = analysis.missing_markers();

        let count = |kind: ArtifactKind| artifacts.iter().filter(|a| a.kind == kind).count();
        let rules_written = analysis
            .extractions
            .iter()
            .filter_map(|e| StyleSheet::for_file(e, &analysis.store))
            .map(|s| s.rules.len())
            .sum();

        let summary = RunSummary {
            files_scanned: analysis.extractions.len() + analysis.failures.len(),
            files_failed: analysis.failures.len(),
            mappings: analysis.store.len(),
            rules_written,
            css_files_written: count(ArtifactKind::Stylesheet),
            sources_written: count(ArtifactKind::Source),
            missing_markers: missing_markers.len(),
            conflicts: conflicts.len(),
            failures: analysis.failures,
            write_errors,
        };

        RunReport {
            summary,
            missing_markers,
            conflicts,
            duplicates,
            artifacts,
            dry_run,
        }
    }
}

/// Write every artifact, continuing past failures.
pub fn write_all(root: &Path, artifacts: &[Artifact]) -> Vec<FileFailure> {
    let mut errors = Vec::new();
    for artifact in artifacts {
        if let Err(e) = write_artifact(&artifact.path, &artifact.contents) {
            warn!("{}", e);
            errors.push(FileFailure {
                path: relative_path(root, &artifact.path),
                message: e.to_string(),
            });
        }
    }
    if !errors.is_empty() {
        info!(
            "{} artifact write(s) failed; outputs may be out of step until the next full run",
            errors.len()
        );
    }
    errors
}

/// Output form of the content pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFormat {
    #[default]
    Documents,
    Samples,
}

#[derive(Debug, Serialize)]
pub struct ContentReport {
    pub files_scanned: usize,
    pub samples: usize,
    /// category → documents
    pub documents: BTreeMap<String, Vec<Document>>,
    pub failures: Vec<FileFailure>,
    pub write_errors: Vec<FileFailure>,
    pub artifacts: Vec<Artifact>,
}

/// Secondary pipeline: sample reconstruction and per-category outputs.
pub fn run_content(
    root: &Path,
    config: &SemclassConfig,
    pattern: &str,
    category: Option<&str>,
    format: ContentFormat,
    out: &Path,
    options: &RunOptions,
) -> Result<ContentReport> {
    let selector = SourceSelector::new(root, pattern)?.excluding([out.to_path_buf()]);
    let files = selector.gather();
    info!("Scanning {} file(s) for samples", files.len());

    let results: Vec<(PathBuf, Result<FileSamples>)> = files
        .par_iter()
        .map(|path| {
            let relative = relative_path(root, path);
            let result = read_source(path).and_then(|source| {
                content::extract_samples(&source, path, &relative, &config.content)
            });
            (path.clone(), result)
        })
        .collect();

    let mut failures = Vec::new();
    let mut by_category: BTreeMap<String, Vec<FileSamples>> = BTreeMap::new();
    for (path, result) in results {
        match result {
            Ok(file) if file.samples.is_empty() => {}
            Ok(file) => {
                let cat = category
                    .map(str::to_string)
                    .unwrap_or_else(|| content::category_for(&file.relative));
                by_category.entry(cat).or_default().push(file);
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                failures.push(FileFailure {
                    path: relative_path(root, &path),
                    message: e.to_string(),
                });
            }
        }
    }

    let mut artifacts = Vec::new();
    let mut documents = BTreeMap::new();
    let mut sample_count = 0;
    for (cat, mut files) in by_category {
        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        let samples: Vec<content::ContentSample> =
            files.iter().flat_map(|f| f.samples.iter().cloned()).collect();
        sample_count += samples.len();

        match format {
            ContentFormat::Documents => {
                let docs = content::build_documents(
                    &samples,
                    &cat,
                    &config.content.embedding_model,
                );
                artifacts.push(Artifact {
                    kind: ArtifactKind::Documents,
                    path: out.join(format!("{cat}.json")),
                    contents: serde_json::to_string_pretty(&docs)? + "\n",
                });
                documents.insert(cat, docs);
            }
            ContentFormat::Samples => {
                let mut imports: Vec<String> = Vec::new();
                for file in &files {
                    let source_dir = root
                        .join(&file.relative)
                        .parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    for import in &file.imports {
                        let statement = import.rebased(&source_dir, out);
                        if !imports.contains(&statement) {
                            imports.push(statement);
                        }
                    }
                }
                artifacts.push(Artifact {
                    kind: ArtifactKind::Samples,
                    path: out.join(format!("{cat}.samples.ts")),
                    contents: content::render_samples_module(&imports, &samples),
                });
            }
        }
    }

    let write_errors = if options.dry_run {
        Vec::new()
    } else {
        write_all(root, &artifacts)
    };

    Ok(ContentReport {
        files_scanned: files.len(),
        samples: sample_count,
        documents,
        failures,
        write_errors,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "src/ui/Card.tsx",
            r#"export const Card = () => (
  <div className="rounded-lg border p-4" data-semantic="card">
    <div className="flex items-center gap-2" data-semantic="card-header">x</div>
    <p className="text-sm text-muted">body</p>
  </div>
);
"#,
        );
        write(
            temp.path(),
            "src/ui/Button.tsx",
            r#"export const A = () => <button className="flex gap-2" data-semantic="btn-a" />;
export const B = () => <button className="gap-2 flex" data-semantic="btn-b" />;
"#,
        );
        write(temp.path(), "src/ui/Broken.tsx", "export const X = () => <div className=>;\n");
        temp
    }

    fn pipeline(root: &Path) -> Pipeline {
        Pipeline::new(root, SemclassConfig::default(), "src/**/*.tsx").unwrap()
    }

    #[test]
    fn test_full_run_writes_artifacts() {
        let temp = project();
        let report = pipeline(temp.path()).run(&RunOptions::default());

        assert_eq!(report.summary.files_scanned, 3);
        assert_eq!(report.summary.files_failed, 1);
        assert_eq!(report.summary.failures[0].path, "src/ui/Broken.tsx");
        assert_eq!(report.summary.mappings, 4);
        assert!(report.summary.write_errors.is_empty());

        let css = fs::read_to_string(temp.path().join("generated/css/src/ui/Card.css")).unwrap();
        assert!(css.contains(".card-header {\n  @apply flex gap-2 items-center;\n}\n"));

        let index = fs::read_to_string(temp.path().join("generated/css/index.css")).unwrap();
        let imports: Vec<&str> = index.lines().filter(|l| l.starts_with("@import")).collect();
        assert_eq!(
            imports,
            vec![
                r#"@import "./src/ui/Button.css";"#,
                r#"@import "./src/ui/Card.css";"#
            ]
        );

        let rewritten =
            fs::read_to_string(temp.path().join("generated/components/src/ui/Card.tsx")).unwrap();
        assert!(rewritten.contains(r#"<div className="card">"#));
        assert!(!rewritten.contains("data-semantic"));

        let barrel =
            fs::read_to_string(temp.path().join("generated/components/src/ui/index.ts")).unwrap();
        assert_eq!(
            barrel,
            "export * from \"./Button\";\nexport * from \"./Card\";\n"
        );

        assert_eq!(report.missing_markers.len(), 1);
        assert_eq!(report.duplicates.exact.len(), 1);
        assert_eq!(report.duplicates.exact[0].markers, vec!["btn-a", "btn-b"]);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp = project();
        let report = pipeline(temp.path()).run(&RunOptions { dry_run: true });
        assert!(report.dry_run);
        assert!(!report.artifacts.is_empty());
        assert!(!temp.path().join("generated").exists());
    }

    #[test]
    fn test_second_run_ignores_generated_sources() {
        let temp = project();
        let p = pipeline(temp.path());
        p.run(&RunOptions::default());
        let report = pipeline(temp.path()).run(&RunOptions::default());
        assert_eq!(report.summary.files_scanned, 3);
    }

    #[test]
    fn test_parallel_result_matches_sequential_merge() {
        let temp = project();
        let p = pipeline(temp.path());
        let analysis = p.analyze();
        let mut reversed = analysis.extractions.clone();
        reversed.reverse();
        assert_eq!(Pipeline::reduce(&reversed), analysis.store);
    }

    #[test]
    fn test_same_stem_components_keep_both_sheets() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "Card.tsx",
            r#"export const A = () => <div className="p-4" data-semantic="card-ts" />;"#,
        );
        write(
            temp.path(),
            "Card.jsx",
            r#"export const B = () => <div className="p-2" data-semantic="card-js" />;"#,
        );
        write(
            temp.path(),
            "index.tsx",
            r#"export const I = () => <main className="grid" data-semantic="root" />;"#,
        );
        let p = Pipeline::new(temp.path(), SemclassConfig::default(), "*.{tsx,jsx}").unwrap();
        p.run(&RunOptions::default());

        let css = temp.path().join("generated/css");
        let ts = fs::read_to_string(css.join("Card.tsx.css")).unwrap();
        let js = fs::read_to_string(css.join("Card.jsx.css")).unwrap();
        assert!(ts.contains(".card-ts {"));
        assert!(js.contains(".card-js {"));
        assert!(!css.join("Card.css").exists());

        let index = fs::read_to_string(css.join("index.css")).unwrap();
        assert!(!index.contains(".root"));
        let imports: Vec<&str> = index.lines().filter(|l| l.starts_with("@import")).collect();
        assert_eq!(
            imports,
            vec![
                r#"@import "./Card.jsx.css";"#,
                r#"@import "./Card.tsx.css";"#,
                r#"@import "./index.tsx.css";"#,
            ]
        );
        let root_sheet = fs::read_to_string(css.join("index.tsx.css")).unwrap();
        assert!(root_sheet.contains(".root {\n  @apply grid;\n}\n"));
    }

    #[test]
    fn test_invalid_marker_leaves_element_alone() {
        let temp = TempDir::new().unwrap();
        let src = r#"export const C = () => (
  <div className="p-4" data-semantic="card body">
    <h2 className="font-bold" data-semantic="card-title">t</h2>
  </div>
);
"#;
        write(temp.path(), "src/C.tsx", src);
        let report = pipeline(temp.path()).run(&RunOptions::default());
        assert_eq!(report.summary.mappings, 1);

        let css = fs::read_to_string(temp.path().join("generated/css/src/C.css")).unwrap();
        assert!(css.contains(".card-title {"));
        assert!(!css.contains("card body"));

        let rewritten =
            fs::read_to_string(temp.path().join("generated/components/src/C.tsx")).unwrap();
        assert!(rewritten.contains(r#"<div className="p-4" data-semantic="card body">"#));
        assert!(rewritten.contains(r#"<h2 className="card-title">"#));
    }

    #[test]
    fn test_content_documents() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "blocks/marketing/Hero.tsx",
            r#"import heroImage from "./hero.png";
export const hero = defineSample({ type: "hero", variant: "split", data: { title: "Hi", image: heroImage } });
"#,
        );
        let out = temp.path().join("generated/content");
        let report = run_content(
            temp.path(),
            &SemclassConfig::default(),
            "blocks/**/*.tsx",
            None,
            ContentFormat::Documents,
            &out,
            &RunOptions::default(),
        )
        .unwrap();
        assert_eq!(report.samples, 1);
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("marketing.json")).unwrap()).unwrap();
        assert_eq!(json[0]["id"], "marketing-hero-split");
        assert_eq!(json[0]["path"], "blocks/marketing/Hero.tsx");
    }

    #[test]
    fn test_content_samples_module() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "blocks/marketing/Hero.tsx",
            r#"import heroImage from "./hero.png";
export const hero = defineSample({ type: "hero", variant: "split", data: { image: heroImage } });
"#,
        );
        let out = temp.path().join("out");
        run_content(
            temp.path(),
            &SemclassConfig::default(),
            "blocks/**/*.tsx",
            Some("landing"),
            ContentFormat::Samples,
            &out,
            &RunOptions::default(),
        )
        .unwrap();
        let module = fs::read_to_string(out.join("landing.samples.ts")).unwrap();
        assert!(module.contains("import heroImage from \"../blocks/marketing/hero.png\";"));
        assert!(module.contains("image: heroImage"));
    }
}
