//! Output forms of the content pipeline: indexing documents and a samples module.

use std::collections::BTreeSet;

use serde::Serialize;

use super::ContentSample;
use super::eval::SampleValue;
use super::signature::{ContentSignature, Orientation, StructureSignature};

#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    pub description: String,
    pub tags: Vec<String>,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embedding {
    pub model: String,
    pub text: String,
}

/// One sample as consumed by the external indexer.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub variant: String,
    pub category: String,
    pub path: String,
    pub payload: Payload,
    pub structure: StructureSignature,
    pub content_signature: ContentSignature,
    pub embedding: Embedding,
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "An",
        _ => "A",
    }
}

fn join_words(words: &[&str]) -> String {
    match words {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Human-readable sentence, a pure function of its inputs.
pub fn describe(
    type_tag: &str,
    variant: &str,
    structure: &StructureSignature,
    content: &ContentSignature,
) -> String {
    let layout = structure.layout.as_str();
    let mut text = format!("{} {} {} block", article(layout), layout, type_tag);
    if !variant.is_empty() {
        text.push_str(&format!(" ({variant} variant)"));
    }
    if let Some(columns) = structure.columns {
        let plural = if columns == 1 { "" } else { "s" };
        text.push_str(&format!(" with {columns} column{plural}"));
    }
    match structure.orientation {
        Orientation::MediaLeft => text.push_str(", media on the left"),
        Orientation::MediaRight => text.push_str(", media on the right"),
        Orientation::Reversed => text.push_str(", reversed"),
        Orientation::Default => {}
    }
    let kinds = content.kinds();
    if kinds.is_empty() {
        text.push('.');
    } else {
        text.push_str(&format!(", containing {}.", join_words(&kinds)));
    }
    text
}

/// Flat `key: value` text fed to the embedding model.
pub fn embedding_text(
    type_tag: &str,
    variant: &str,
    category: &str,
    structure: &StructureSignature,
    content: &ContentSignature,
) -> String {
    let mut parts = vec![
        format!("type: {type_tag}"),
        format!("variant: {variant}"),
        format!("category: {category}"),
        format!("layout: {}", structure.layout.as_str()),
    ];
    if let Some(columns) = structure.columns {
        parts.push(format!("columns: {columns}"));
    }
    parts.push(format!("orientation: {}", structure.orientation.as_str()));
    let kinds = content.kinds();
    if !kinds.is_empty() {
        parts.push(format!("content: {}", kinds.join(" ")));
    }
    parts.join(" | ")
}

fn slug(parts: &[&str]) -> String {
    let mut out = String::new();
    for ch in parts.join("-").chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Documents for one category, ids made unique with a numeric suffix.
pub fn build_documents(samples: &[ContentSample], category: &str, model: &str) -> Vec<Document> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    samples
        .iter()
        .map(|sample| {
            let structure = StructureSignature::derive(&sample.type_tag, &sample.data);
            let content = ContentSignature::derive(&sample.data);

            let base = slug(&[category, &sample.type_tag, &sample.variant]);
            let mut id = base.clone();
            let mut n = 2;
            while !used.insert(id.clone()) {
                id = format!("{base}-{n}");
                n += 1;
            }

            let mut tags: Vec<String> = Vec::new();
            let mut push_tag = |tag: &str| {
                if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                    tags.push(tag.to_string());
                }
            };
            push_tag(&sample.type_tag);
            push_tag(&sample.variant);
            push_tag(structure.layout.as_str());
            for kind in content.kinds() {
                push_tag(kind);
            }

            Document {
                id,
                type_tag: sample.type_tag.clone(),
                variant: sample.variant.clone(),
                category: category.to_string(),
                path: sample.location.file.clone(),
                payload: Payload {
                    description: describe(&sample.type_tag, &sample.variant, &structure, &content),
                    tags,
                    category: category.to_string(),
                },
                embedding: Embedding {
                    model: model.to_string(),
                    text: embedding_text(
                        &sample.type_tag,
                        &sample.variant,
                        category,
                        &structure,
                        &content,
                    ),
                },
                structure,
                content_signature: content,
            }
        })
        .collect()
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.escape_default()))
}

fn number_source(n: f64) -> String {
    if !n.is_finite() {
        "null".to_string()
    } else if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Value as a TS expression. References to imported names stay bare identifiers.
pub fn to_source(value: &SampleValue, indent: usize) -> String {
    let pad = "  ".repeat(indent + 1);
    let close = "  ".repeat(indent);
    match value {
        SampleValue::Null | SampleValue::Unknown => "null".to_string(),
        SampleValue::Bool(b) => b.to_string(),
        SampleValue::Number(n) => number_source(*n),
        SampleValue::String(s) => quote(s),
        SampleValue::Reference(name) => name.clone(),
        SampleValue::Array(items) if items.is_empty() => "[]".to_string(),
        SampleValue::Array(items) => {
            let body: Vec<String> = items
                .iter()
                .map(|v| format!("{pad}{}", to_source(v, indent + 1)))
                .collect();
            format!("[\n{},\n{close}]", body.join(",\n"))
        }
        SampleValue::Object(props) if props.is_empty() => "{}".to_string(),
        SampleValue::Object(props) => {
            let body: Vec<String> = props
                .iter()
                .map(|(k, v)| {
                    let key = if is_identifier(k) { k.clone() } else { quote(k) };
                    format!("{pad}{key}: {}", to_source(v, indent + 1))
                })
                .collect();
            format!("{{\n{},\n{close}}}", body.join(",\n"))
        }
    }
}

/// `{category}.samples.ts`: copied import statements, then the default export.
pub fn render_samples_module(imports: &[String], samples: &[ContentSample]) -> String {
    let mut out = String::from("// Generated by semclass. Do not edit by hand.\n");
    for statement in imports {
        out.push_str(statement.trim_end());
        out.push('\n');
    }
    if !imports.is_empty() {
        out.push('\n');
    }

    let entries: Vec<SampleValue> = samples
        .iter()
        .map(|s| {
            SampleValue::Object(vec![
                ("type".to_string(), SampleValue::String(s.type_tag.clone())),
                ("variant".to_string(), SampleValue::String(s.variant.clone())),
                ("data".to_string(), s.data.clone()),
            ])
        })
        .collect();
    out.push_str("export default ");
    out.push_str(&to_source(&SampleValue::Array(entries), 0));
    out.push_str(";\n");
    out
}
