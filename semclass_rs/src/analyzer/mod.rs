pub mod content;
pub mod coverage;
pub mod crowd;
pub mod css;
pub mod jsx;
pub mod mapping;
pub mod normalize;
pub mod parse;
pub mod rewrite;
pub mod runner;
pub mod twins;

use oxc_ast::ast::Expression;

/// Strip wrappers that do not change the runtime value:
/// `(x)`, `x as T`, `x satisfies T`, `x!`, `<T>x`.
pub(crate) fn unwrap_expression<'s, 'a>(expr: &'s Expression<'a>) -> &'s Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSAsExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSSatisfiesExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSNonNullExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSTypeAssertion(inner) => unwrap_expression(&inner.expression),
        other => other,
    }
}

pub use coverage::CoverageValidator;
pub use jsx::AttributeExtractor;
pub use mapping::MappingStore;
pub use normalize::ClassSet;
pub use runner::{Pipeline, RunOptions};
