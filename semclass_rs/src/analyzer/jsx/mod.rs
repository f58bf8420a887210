//! Attribute extraction from JSX/TSX components.
//!
//! For every element the extractor looks at two attributes:
//! - the *marker* attribute (`data-semantic` by default), accepted only when its
//!   value is a literal string;
//! - the *class* attribute (`className`/`class`), evaluated by the ordered
//!   [`HandlerChain`].
//!
//! # Module Structure
//!
//! - `handlers`: class-expression handlers and the chain that orders them
//! - `visitor`: the OXC visitor producing [`ElementOccurrence`] records

mod handlers;
mod visitor;

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_ast_visit::Visit;

pub use handlers::{
    ClassExprHandler, ClassValue, Extracted, HandlerChain, LiteralHandler, MergeCallHandler,
    TemplateHandler,
};
pub(crate) use handlers::static_string;
pub(crate) use visitor::attribute_name;

use crate::analyzer::parse::parse_program;
use crate::config::SemclassConfig;
use crate::error::Result;
use crate::types::ElementOccurrence;

use visitor::ClassVisitor;

/// Traversal settings: which attributes to read and how to evaluate class values.
pub struct AttributeExtractor {
    pub marker_attribute: String,
    pub class_attributes: Vec<String>,
    pub chain: HandlerChain,
}

impl AttributeExtractor {
    pub fn new(
        marker_attribute: impl Into<String>,
        class_attributes: Vec<String>,
        chain: HandlerChain,
    ) -> Self {
        Self {
            marker_attribute: marker_attribute.into(),
            class_attributes,
            chain,
        }
    }

    pub fn from_config(config: &SemclassConfig) -> Self {
        Self::new(
            config.marker_attribute.clone(),
            config.class_attributes.clone(),
            HandlerChain::standard(&config.merge_helpers),
        )
    }

    /// Collect occurrences from an already parsed program.
    pub fn extract_program(
        &self,
        program: &Program<'_>,
        source: &str,
        file: &str,
    ) -> Vec<ElementOccurrence> {
        let mut visitor = ClassVisitor::new(self, source, file);
        visitor.visit_program(program);
        visitor.occurrences
    }

    /// Parse and extract in one step. The tree is dropped before returning.
    pub fn extract_source(
        &self,
        source: &str,
        path: &Path,
        file: &str,
    ) -> Result<Vec<ElementOccurrence>> {
        let allocator = Allocator::default();
        let program = parse_program(&allocator, source, path)?;
        Ok(self.extract_program(&program, source, file))
    }
}

impl Default for AttributeExtractor {
    fn default() -> Self {
        Self::from_config(&SemclassConfig::default())
    }
}
