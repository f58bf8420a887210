//! ClassVisitor: walks JSX opening elements and records class/marker attributes.

use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_span::GetSpan;
use tracing::debug;

use super::AttributeExtractor;
use super::handlers::{ClassValue, Extracted, static_string};
use crate::analyzer::normalize::{ClassSet, declared_tokens};
use crate::types::{
    ByteSpan, ClassExprKind, ElementOccurrence, Location, MarkerValue, offset_to_location,
};

/// Visitor collecting one [`ElementOccurrence`] per element that carries a class
/// attribute or a marker attribute.
pub(super) struct ClassVisitor<'s> {
    pub extractor: &'s AttributeExtractor,
    pub source_text: &'s str,
    pub file: &'s str,
    pub occurrences: Vec<ElementOccurrence>,
}

impl<'s> ClassVisitor<'s> {
    pub(super) fn new(
        extractor: &'s AttributeExtractor,
        source_text: &'s str,
        file: &'s str,
    ) -> Self {
        Self {
            extractor,
            source_text,
            file,
            occurrences: Vec::new(),
        }
    }

    fn location(&self, offset: u32) -> Location {
        let (line, column) = offset_to_location(self.source_text, offset as usize);
        Location {
            file: self.file.to_string(),
            line,
            column,
        }
    }

    fn slice(&self, span: oxc_span::Span) -> &'s str {
        self.source_text
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    fn classify_class<'a>(&self, attr: &JSXAttribute<'a>) -> Extracted {
        match &attr.value {
            Some(JSXAttributeValue::StringLiteral(lit)) => self
                .extractor
                .chain
                .evaluate(&ClassValue::Str(lit.value.as_str())),
            Some(JSXAttributeValue::ExpressionContainer(container)) => {
                match container.expression.as_expression() {
                    Some(expr) => self.extractor.chain.evaluate(&ClassValue::Expr(expr)),
                    None => Extracted::dynamic(),
                }
            }
            _ => Extracted::dynamic(),
        }
    }

    fn record(&mut self, opening: &JSXOpeningElement<'_>) {
        let mut class_attr: Option<(usize, &JSXAttribute<'_>)> = None;
        let mut marker_attr: Option<&JSXAttribute<'_>> = None;

        for item in &opening.attributes {
            let JSXAttributeItem::Attribute(attr) = item else {
                continue;
            };
            let attr: &JSXAttribute<'_> = attr;
            let name = attribute_name(&attr.name);
            if name == self.extractor.marker_attribute {
                marker_attr = Some(attr);
                continue;
            }
            if let Some(rank) = self
                .extractor
                .class_attributes
                .iter()
                .position(|candidate| *candidate == name)
                && class_attr.is_none_or(|(best, _)| rank < best)
            {
                class_attr = Some((rank, attr));
            }
        }

        if class_attr.is_none() && marker_attr.is_none() {
            return;
        }

        let extracted = match class_attr {
            Some((_, attr)) => self.classify_class(attr),
            None => Extracted::new(ClassExprKind::Absent, ""),
        };
        let marker = match marker_attr {
            Some(attr) => marker_value(attr),
            None => MarkerValue::Absent,
        };

        let tag = self.slice(opening.name.span()).to_string();
        if marker == MarkerValue::NonLiteral {
            debug!(
                "{}: <{}> marker is not a literal, element ignored",
                self.file, tag
            );
        }

        self.occurrences.push(ElementOccurrence {
            tag,
            location: self.location(opening.span.start),
            class_kind: extracted.kind,
            declared_tokens: declared_tokens(&extracted.text),
            class_set: ClassSet::parse(&extracted.text),
            class_raw: extracted.text,
            marker,
            class_attr_span: class_attr.map(|(_, attr)| attr.span.into()),
            class_value_span: class_attr
                .and_then(|(_, attr)| attr.value.as_ref())
                .map(|value| ByteSpan::from(value.span())),
            marker_attr_span: marker_attr.map(|attr| attr.span.into()),
        });
    }
}

impl<'a> Visit<'a> for ClassVisitor<'_> {
    fn visit_jsx_opening_element(&mut self, it: &JSXOpeningElement<'a>) {
        self.record(it);
        // attribute values may hold nested JSX (render props, slots)
        walk::walk_jsx_opening_element(self, it);
    }
}

/// Attribute name as written, `ns:name` for namespaced attributes.
pub(crate) fn attribute_name(name: &JSXAttributeName<'_>) -> String {
    match name {
        JSXAttributeName::Identifier(id) => id.name.to_string(),
        JSXAttributeName::NamespacedName(ns) => {
            format!("{}:{}", ns.namespace.name, ns.name.name)
        }
    }
}

fn marker_value(attr: &JSXAttribute<'_>) -> MarkerValue {
    match &attr.value {
        Some(JSXAttributeValue::StringLiteral(lit)) => {
            MarkerValue::Literal(lit.value.to_string())
        }
        Some(JSXAttributeValue::ExpressionContainer(container)) => container
            .expression
            .as_expression()
            .and_then(static_string)
            .map(|s| MarkerValue::Literal(s.to_string()))
            .unwrap_or(MarkerValue::NonLiteral),
        _ => MarkerValue::NonLiteral,
    }
}
