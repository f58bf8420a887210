//! Report rendering for stdout: plain text or JSON.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::analyzer::crowd::{DuplicateReport, format_report};
use crate::analyzer::mapping::MarkerConflict;
use crate::analyzer::runner::{Artifact, ContentReport, RunReport};
use crate::fs_utils::relative_path;
use crate::types::{FileFailure, MissingMarker};

/// `check` output
#[derive(Debug, Serialize)]
pub struct CoverageReport {
    pub files_scanned: usize,
    pub files_failed: usize,
    pub missing_markers: Vec<MissingMarker>,
    pub failures: Vec<FileFailure>,
}

pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

pub fn render_run(report: &RunReport, root: &Path, all_clusters: bool) -> String {
    let s = &report.summary;
    let mut out = String::new();
    let _ = writeln!(out, "Extraction summary");
    let _ = writeln!(
        out,
        "  files scanned: {} ({} failed)",
        s.files_scanned, s.files_failed
    );
    let _ = writeln!(out, "  mappings: {}", s.mappings);
    let _ = writeln!(
        out,
        "  stylesheets: {} ({} rules)",
        s.css_files_written, s.rules_written
    );
    let _ = writeln!(out, "  rewritten sources: {}", s.sources_written);

    failures_section(&mut out, "Failed files", &s.failures);
    failures_section(&mut out, "Failed writes", &s.write_errors);
    missing_section(&mut out, &report.missing_markers);
    conflicts_section(&mut out, &report.conflicts);

    if report.dry_run {
        artifacts_section(&mut out, "Would write", &report.artifacts, root);
    }

    out.push('\n');
    out.push_str(&format_report(&report.duplicates, all_clusters));
    out
}

pub fn render_coverage(report: &CoverageReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Coverage: {} file(s) scanned, {} missing marker(s)",
        report.files_scanned,
        report.missing_markers.len()
    );
    missing_section(&mut out, &report.missing_markers);
    failures_section(&mut out, "Failed files", &report.failures);
    out
}

pub fn render_duplicates(report: &DuplicateReport, all_clusters: bool) -> String {
    format_report(report, all_clusters)
}

pub fn render_content(report: &ContentReport, root: &Path, dry_run: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Content: {} sample(s) from {} file(s)",
        report.samples, report.files_scanned
    );
    for (category, docs) in &report.documents {
        let _ = writeln!(out, "  {category}: {} document(s)", docs.len());
    }
    failures_section(&mut out, "Failed files", &report.failures);
    failures_section(&mut out, "Failed writes", &report.write_errors);
    let title = if dry_run { "Would write" } else { "Wrote" };
    artifacts_section(&mut out, title, &report.artifacts, root);
    out
}

fn missing_section(out: &mut String, missing: &[MissingMarker]) {
    if missing.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nMissing markers ({}):", missing.len());
    for m in missing {
        let _ = writeln!(
            out,
            "  {}  <{}>  [{}]  suggested: {}",
            m.location, m.tag, m.class_set, m.suggested
        );
    }
}

fn conflicts_section(out: &mut String, conflicts: &[MarkerConflict]) {
    if conflicts.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nMarker conflicts ({}):", conflicts.len());
    for c in conflicts {
        let _ = writeln!(out, "  {} (using [{}])", c.marker, c.effective);
        for v in &c.variants {
            let at: Vec<String> = v.locations.iter().map(|l| l.to_string()).collect();
            let _ = writeln!(out, "      [{}] at {}", v.class_set, at.join(", "));
        }
    }
}

fn failures_section(out: &mut String, title: &str, failures: &[FileFailure]) {
    if failures.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title} ({}):", failures.len());
    for f in failures {
        let _ = writeln!(out, "  {}: {}", f.path, f.message);
    }
}

fn artifacts_section(out: &mut String, title: &str, artifacts: &[Artifact], root: &Path) {
    if artifacts.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title} ({}):", artifacts.len());
    for a in artifacts {
        let _ = writeln!(out, "  {}", relative_path(root, &a.path));
    }
}
