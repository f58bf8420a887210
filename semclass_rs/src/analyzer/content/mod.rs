//! Content pipeline: reconstruct sample data from component sources.
//!
//! Two sample forms are recognised:
//! - `defineSample({ type: "hero", variant: "split", data: { ... } })`
//! - `<Block type="hero" variant="split" data={{ ... }} />`
//!
//! Each file is parsed once. A first pass collects top-level constants and
//! imports ([`eval::ModuleScope`]); the visitor then evaluates every sample
//! against that scope. Output is either indexing documents or a samples module
//! (see [`document`]).
//!
//! # Module Structure
//!
//! - `eval`: the literal evaluator and [`SampleValue`]
//! - `signature`: structure/content signatures
//! - `document`: documents, descriptions, samples module rendering

pub mod document;
pub mod eval;
pub mod signature;

use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_span::GetSpan;
use serde::Serialize;

pub use document::{Document, build_documents, render_samples_module};
pub use eval::{Evaluator, ModuleScope, SampleValue};
pub use signature::{ContentSignature, LayoutKind, Orientation, StructureSignature};

use crate::analyzer::jsx::attribute_name;
use crate::analyzer::parse::parse_program;
use crate::analyzer::unwrap_expression;
use crate::config::ContentConfig;
use crate::error::Result;
use crate::fs_utils::module_specifier;
use crate::types::{Location, offset_to_location};

/// One reconstructed sample invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ContentSample {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub variant: String,
    pub data: SampleValue,
    pub location: Location,
}

/// Samples of one file plus the import statements they reference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSamples {
    pub relative: String,
    pub samples: Vec<ContentSample>,
    /// Import statements for names used inside sample data
    pub imports: Vec<SampleImport>,
}

/// Import statement copied from a component into a samples module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleImport {
    /// Statement text as written
    pub statement: String,
    /// Module specifier without quotes (`./hero.png`)
    pub specifier: String,
    /// Quoted specifier within `statement`
    #[serde(skip)]
    specifier_range: Range<usize>,
}

impl SampleImport {
    /// Statement text for a module written to `out_dir`. `./` and `../`
    /// specifiers are re-based from `source_dir`; package specifiers are kept.
    pub fn rebased(&self, source_dir: &Path, out_dir: &Path) -> String {
        let relative = self.specifier.starts_with("./") || self.specifier.starts_with("../");
        let quoted = match self.statement.get(self.specifier_range.clone()) {
            Some(quoted) if relative => quoted,
            _ => return self.statement.clone(),
        };
        let quote = quoted.chars().next().unwrap_or('"');
        let specifier = module_specifier(out_dir, &source_dir.join(&self.specifier));
        format!(
            "{}{quote}{specifier}{quote}{}",
            &self.statement[..self.specifier_range.start],
            &self.statement[self.specifier_range.end..]
        )
    }
}

/// Split a sample object into (type, variant, data). Without an explicit
/// `data` key everything except `type`/`variant` is the data.
fn split_sample(props: Vec<(String, SampleValue)>) -> (String, String, SampleValue) {
    let mut type_tag = String::new();
    let mut variant = String::new();
    let mut data = None;
    let mut rest = Vec::new();
    for (key, value) in props {
        match key.as_str() {
            "type" => type_tag = value.as_str().unwrap_or_default().to_string(),
            "variant" => variant = value.as_str().unwrap_or_default().to_string(),
            "data" => data = Some(value),
            _ => rest.push((key, value)),
        }
    }
    (type_tag, variant, data.unwrap_or(SampleValue::Object(rest)))
}

struct SampleVisitor<'v, 's, 'a> {
    evaluator: Evaluator<'v, 's, 'a>,
    config: &'v ContentConfig,
    source: &'v str,
    file: &'v str,
    samples: Vec<ContentSample>,
}

impl SampleVisitor<'_, '_, '_> {
    fn location(&self, offset: u32) -> Location {
        let (line, column) = offset_to_location(self.source, offset as usize);
        Location {
            file: self.file.to_string(),
            line,
            column,
        }
    }

    fn push(&mut self, props: Vec<(String, SampleValue)>, offset: u32) {
        let (type_tag, variant, data) = split_sample(props);
        let location = self.location(offset);
        self.samples.push(ContentSample {
            type_tag,
            variant,
            data,
            location,
        });
    }

    fn record_call(&mut self, call: &CallExpression<'_>) {
        let Expression::Identifier(callee) = unwrap_expression(&call.callee) else {
            return;
        };
        if !self
            .config
            .sample_callees
            .iter()
            .any(|c| c == callee.name.as_str())
        {
            return;
        }
        let Some(arg) = call.arguments.first().and_then(|a| a.as_expression()) else {
            return;
        };
        if let SampleValue::Object(props) = self.evaluator.eval(arg) {
            self.push(props, call.span.start);
        }
    }

    fn record_element(&mut self, opening: &JSXOpeningElement<'_>) {
        let span = opening.name.span();
        let name = self
            .source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("");
        if !self.config.sample_components.iter().any(|c| c == name) {
            return;
        }

        let mut props = Vec::new();
        for item in &opening.attributes {
            match item {
                JSXAttributeItem::Attribute(attr) => {
                    let value = match &attr.value {
                        None => SampleValue::Bool(true),
                        Some(JSXAttributeValue::StringLiteral(lit)) => {
                            SampleValue::String(lit.value.to_string())
                        }
                        Some(JSXAttributeValue::ExpressionContainer(container)) => {
                            match container.expression.as_expression() {
                                Some(expr) => self.evaluator.eval(expr),
                                None => SampleValue::Unknown,
                            }
                        }
                        Some(_) => SampleValue::Unknown,
                    };
                    props.push((attribute_name(&attr.name), value));
                }
                JSXAttributeItem::SpreadAttribute(spread) => {
                    if let SampleValue::Object(inner) = self.evaluator.eval(&spread.argument) {
                        props.extend(inner);
                    }
                }
            }
        }
        self.push(props, opening.span.start);
    }
}

impl<'a> Visit<'a> for SampleVisitor<'_, '_, '_> {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        self.record_call(it);
        walk::walk_call_expression(self, it);
    }

    fn visit_jsx_opening_element(&mut self, it: &JSXOpeningElement<'a>) {
        self.record_element(it);
        walk::walk_jsx_opening_element(self, it);
    }
}

/// Parse one file and reconstruct every sample in it.
pub fn extract_samples(
    source: &str,
    path: &Path,
    relative: &str,
    config: &ContentConfig,
) -> Result<FileSamples> {
    let allocator = Allocator::default();
    let program = parse_program(&allocator, source, path)?;
    let scope = ModuleScope::collect(&program);

    let mut visitor = SampleVisitor {
        evaluator: scope.evaluator(),
        config,
        source,
        file: relative,
        samples: Vec::new(),
    };
    visitor.visit_program(&program);
    let samples = visitor.samples;

    let mut referenced = BTreeSet::new();
    for sample in &samples {
        sample.data.references(&mut referenced);
    }
    let mut imports: Vec<SampleImport> = Vec::new();
    for binding in scope.imports() {
        if !referenced.contains(&binding.local) {
            continue;
        }
        let Some(text) = source.get(binding.statement.range()) else {
            continue;
        };
        if text.is_empty() || imports.iter().any(|i| i.statement == text) {
            continue;
        }
        let start = binding.source.start.saturating_sub(binding.statement.start) as usize;
        let end = binding.source.end.saturating_sub(binding.statement.start) as usize;
        imports.push(SampleImport {
            statement: text.to_string(),
            specifier: binding.specifier.clone(),
            specifier_range: start..end,
        });
    }

    Ok(FileSamples {
        relative: relative.to_string(),
        samples,
        imports,
    })
}

/// Category of a file: its parent directory name, `uncategorized` at the root.
pub fn category_for(relative: &str) -> String {
    relative
        .rsplit('/')
        .nth(1)
        .filter(|dir| !dir.is_empty())
        .unwrap_or("uncategorized")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(src: &str) -> FileSamples {
        extract_samples(
            src,
            Path::new("blocks/marketing/Hero.tsx"),
            "blocks/marketing/Hero.tsx",
            &ContentConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_call_form_with_data_key() {
        let out = extract(
            r#"
import heroImage from "./hero.png";
import { unused } from "./other";
const shared = { title: "Ship faster", image: heroImage };
export const hero = defineSample({ type: "hero", variant: "split", data: { ...shared, mediaLeft: true } });
"#,
        );
        assert_eq!(out.samples.len(), 1);
        let s = &out.samples[0];
        assert_eq!(s.type_tag, "hero");
        assert_eq!(s.variant, "split");
        assert_eq!(s.location.line, 5);
        assert_eq!(s.data.get("mediaLeft"), Some(&SampleValue::Bool(true)));
        assert_eq!(out.imports.len(), 1);
        assert_eq!(out.imports[0].statement, r#"import heroImage from "./hero.png";"#);
        assert_eq!(out.imports[0].specifier, "./hero.png");
    }

    #[test]
    fn test_relative_imports_rebased_to_output_dir() {
        let out = extract(
            r#"
import heroImage from './hero.png';
import { Icon } from "@acme/icons";
export const hero = defineSample({ type: "hero", variant: "split", data: { image: heroImage, icon: Icon } });
"#,
        );
        let root = Path::new("/project");
        let source_dir = root.join("blocks/marketing");
        let lines: Vec<String> = out
            .imports
            .iter()
            .map(|i| i.rebased(&source_dir, &root.join("generated/content")))
            .collect();
        assert_eq!(
            lines,
            vec![
                "import heroImage from '../../blocks/marketing/hero.png';".to_string(),
                r#"import { Icon } from "@acme/icons";"#.to_string(),
            ]
        );
        assert_eq!(
            out.imports[0].rebased(&source_dir, &source_dir),
            "import heroImage from './hero.png';"
        );
    }

    #[test]
    fn test_call_form_without_data_key() {
        let out = extract(r#"sample({ type: "faq", variant: "plain", items: ["a", "b"] });"#);
        let s = &out.samples[0];
        assert!(s.data.get("items").is_some());
        assert!(s.data.get("type").is_none());
    }

    #[test]
    fn test_jsx_form() {
        let out = extract(
            r#"
const cols = 3;
export const Demo = () => (
  <div>
    <Block type="feature-grid" variant="compact" data={{ title: "Features", columns: cols, items: [] }} />
    <Other type="x" />
  </div>
);
"#,
        );
        assert_eq!(out.samples.len(), 1);
        let s = &out.samples[0];
        assert_eq!(s.type_tag, "feature-grid");
        assert_eq!(s.data.get("columns"), Some(&SampleValue::Number(3.0)));
        assert_eq!(s.location.line, 5);
    }

    #[test]
    fn test_non_object_argument_ignored() {
        let out = extract(r#"defineSample(makeSample());"#);
        assert!(out.samples.is_empty());
    }

    #[test]
    fn test_category_for() {
        assert_eq!(category_for("blocks/marketing/Hero.tsx"), "marketing");
        assert_eq!(category_for("Hero.tsx"), "uncategorized");
    }
}
