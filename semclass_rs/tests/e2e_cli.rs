//! End-to-end CLI tests for semclass.
//!
//! Fixtures are copied into a temp dir first: `extract` and `content` write
//! artifacts next to the sources.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn semclass() -> Command {
    cargo_bin_cmd!("semclass")
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Temp copy of a fixture project
fn project(name: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    copy_dir(&fixtures_path().join(name), temp.path());
    temp
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"))
}

// ============================================
// Basic CLI Tests
// ============================================

mod cli_basics {
    use super::*;

    #[test]
    fn shows_help() {
        semclass()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("extract"))
            .stdout(predicate::str::contains("dups"));
    }

    #[test]
    fn shows_version() {
        semclass()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn missing_pattern_exits_one_before_reading() {
        let temp = TempDir::new().unwrap();
        semclass()
            .args(["extract", "--root"])
            .arg(temp.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("no input pattern"));
        assert!(!temp.path().join("generated").exists());
    }

    #[test]
    fn unknown_category_exits_one() {
        let temp = project("components");
        semclass()
            .args(["check", "--category", "nope", "--root"])
            .arg(temp.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown category `nope`"));
    }
}

// ============================================
// Extract
// ============================================

mod extract {
    use super::*;

    #[test]
    fn writes_css_sources_and_indexes() {
        let temp = project("components");
        let root = temp.path();

        semclass()
            .args(["extract", "-q", "--root"])
            .arg(root)
            .assert()
            .success()
            .stdout(predicate::str::contains("files scanned: 4 (1 failed)"))
            .stdout(predicate::str::contains("src/ui/Broken.tsx"));

        let card = read(root, "generated/css/src/ui/Card.css");
        assert!(card.contains(".card-header {\n  @apply flex gap-2 items-center;\n}\n"));
        assert!(card.contains(".card-title {\n  @apply flex;\n}\n"));
        assert!(!card.contains("bg-primary"));

        let index = read(root, "generated/css/index.css");
        let imports: Vec<&str> = index.lines().filter(|l| l.starts_with("@import")).collect();
        assert_eq!(
            imports,
            vec![
                r#"@import "./src/forms/Field.css";"#,
                r#"@import "./src/ui/Button.css";"#,
                r#"@import "./src/ui/Card.css";"#,
            ]
        );

        let rewritten = read(root, "generated/components/src/ui/Card.tsx");
        assert!(rewritten.contains(r#"<div className="card-header">"#));
        assert!(rewritten.contains(r#"<h2 className="card-title">"#));
        assert!(rewritten.contains(r#"<p className="p-4 m-2">Body</p>"#));
        assert!(!rewritten.contains("data-semantic"));

        assert_eq!(
            read(root, "generated/components/src/ui/index.ts"),
            "export * from \"./Button\";\nexport * from \"./Card\";\n"
        );
    }

    #[test]
    fn failed_files_turn_status_into_warning() {
        let temp = project("components");
        semclass()
            .args(["extract", "--dry-run", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stderr(predicate::str::contains("4 files, 6 mappings, 1 with errors"));
    }

    #[test]
    fn output_is_deterministic() {
        let temp = project("components");
        let root = temp.path();
        semclass().args(["extract", "-q", "--root"]).arg(root).assert().success();
        let first = read(root, "generated/css/src/ui/Card.css");
        let first_index = read(root, "generated/css/index.css");

        semclass().args(["extract", "-q", "--root"]).arg(root).assert().success();
        assert_eq!(read(root, "generated/css/src/ui/Card.css"), first);
        assert_eq!(read(root, "generated/css/index.css"), first_index);
    }

    #[test]
    fn dry_run_lists_artifacts_without_writing() {
        let temp = project("components");
        semclass()
            .args(["extract", "--dry-run", "-q", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Would write"))
            .stdout(predicate::str::contains("generated/css/index.css"));
        assert!(!temp.path().join("generated").exists());
    }

    #[test]
    fn category_narrows_input() {
        let temp = project("components");
        semclass()
            .args(["extract", "--category", "forms", "--json", "--root"])
            .arg(temp.path())
            .assert()
            .success();
        assert!(temp.path().join("generated/css/src/forms/Field.css").exists());
        assert!(!temp.path().join("generated/css/src/ui").exists());
    }

    #[test]
    fn json_report_on_stdout() {
        let temp = project("components");
        let output = semclass()
            .args(["extract", "--json", "--dry-run", "--root"])
            .arg(temp.path())
            .output()
            .unwrap();
        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["summary"]["files_failed"], 1);
        assert_eq!(json["summary"]["mappings"], 6);
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["duplicates"]["exact"][0]["markers"][0], "btn-a");
        assert_eq!(json["duplicates"]["exact"][0]["markers"][1], "btn-b");
    }

    #[test]
    fn marker_override() {
        let temp = project("components");
        semclass()
            .args(["extract", "-q", "--marker", "data-role", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("mappings: 0"));
    }
}

// ============================================
// Check / Dups
// ============================================

mod reports {
    use super::*;

    #[test]
    fn check_reports_unmarked_elements() {
        let temp = project("components");
        semclass()
            .args(["check", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("2 missing marker(s)"))
            .stdout(predicate::str::contains("suggested: p-container"))
            .stdout(predicate::str::contains("suggested: span-text-sm"));
        assert!(!temp.path().join("generated").exists());
    }

    #[test]
    fn check_json() {
        let temp = project("components");
        let output = semclass()
            .args(["check", "--json", "--root"])
            .arg(temp.path())
            .output()
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["missing_markers"].as_array().unwrap().len(), 2);
        assert_eq!(json["failures"][0]["path"], "src/ui/Broken.tsx");
    }

    #[test]
    fn dups_finds_twins_and_near_duplicates() {
        let temp = project("components");
        semclass()
            .args(["dups", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Exact duplicates (1)"))
            .stdout(predicate::str::contains("btn-a, btn-b"))
            .stdout(predicate::str::contains("card-header"))
            .stdout(predicate::str::contains("field-row"));
    }

    #[test]
    fn dups_json_levenshtein() {
        let temp = project("components");
        let output = semclass()
            .args(["dups", "--json", "--max-distance", "1", "--root"])
            .arg(temp.path())
            .output()
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let pairs = json["levenshtein"].as_array().unwrap();
        assert!(pairs.iter().any(|p| p["distance"] == 1
            && p["left"]["marker"] == "card-header"
            && p["right"]["marker"] == "field-row"));
    }
}

// ============================================
// Content
// ============================================

mod content {
    use super::*;

    #[test]
    fn writes_documents_per_category() {
        let temp = project("content");
        semclass()
            .args(["content", "--pattern", "blocks/**/*.tsx", "-q", "--root"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("marketing: 1 document(s)"));

        let json: serde_json::Value =
            serde_json::from_str(&read(temp.path(), "generated/content/marketing.json")).unwrap();
        assert_eq!(json[0]["id"], "marketing-hero-split");
        assert_eq!(json[0]["type"], "hero");
        assert_eq!(json[0]["embedding"]["model"], "text-embedding-3-small");
    }

    #[test]
    fn writes_samples_module_with_imports() {
        let temp = project("content");
        semclass()
            .args([
                "content",
                "--pattern",
                "blocks/**/*.tsx",
                "--format",
                "samples",
                "--out",
                "out",
                "-q",
                "--root",
            ])
            .arg(temp.path())
            .assert()
            .success();

        let module = read(temp.path(), "out/marketing.samples.ts");
        // `out/` sits next to `blocks/`, so the specifier climbs one level
        assert!(module.contains(r#"import heroImage from "../blocks/marketing/hero.png";"#));
        assert!(!module.contains(r#""./hero.png""#));
        assert!(module.contains("export default ["));
        assert!(module.contains("heroImage"));
        assert!(module.contains("\"Start\""));
    }
}
