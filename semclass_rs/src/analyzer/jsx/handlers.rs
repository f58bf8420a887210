//! Ordered class-expression handlers.
//!
//! Each handler recognises one syntactic form of a class attribute value and
//! returns the static class text it can recover. The chain tries handlers in
//! order and the first match wins; anything unmatched is `Dynamic` with no text.
//! New forms are added by pushing another [`ClassExprHandler`] into the chain,
//! the visitor does not change.

use oxc_ast::ast::*;
use tracing::trace;

use crate::analyzer::unwrap_expression;
use crate::types::ClassExprKind;

/// Class attribute value as seen by the handlers.
pub enum ClassValue<'s, 'a> {
    /// `className="..."`
    Str(&'s str),
    /// `className={...}`
    Expr(&'s Expression<'a>),
}

/// Static text recovered from a class attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub kind: ClassExprKind,
    pub text: String,
}

impl Extracted {
    pub fn new(kind: ClassExprKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn dynamic() -> Self {
        Self::new(ClassExprKind::Dynamic, "")
    }
}

pub trait ClassExprHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means "not my form", the chain moves on to the next handler.
    fn extract<'a>(&self, value: &ClassValue<'_, 'a>) -> Option<Extracted>;
}

/// String literal, in attribute position or inside `{}`; also backtick strings
/// without holes.
pub struct LiteralHandler;

impl ClassExprHandler for LiteralHandler {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn extract<'a>(&self, value: &ClassValue<'_, 'a>) -> Option<Extracted> {
        match value {
            ClassValue::Str(s) => Some(Extracted::new(ClassExprKind::Literal, *s)),
            ClassValue::Expr(expr) => {
                static_string(expr).map(|s| Extracted::new(ClassExprKind::Literal, s))
            }
        }
    }
}

/// `cn("a b", cond && "c", other)`: literal arguments are kept, everything else
/// is dropped without complaint.
pub struct MergeCallHandler {
    helpers: Vec<String>,
}

impl MergeCallHandler {
    pub fn new(helpers: &[String]) -> Self {
        Self {
            helpers: helpers.to_vec(),
        }
    }

    fn is_helper(&self, callee: &Expression<'_>) -> bool {
        let name = match unwrap_expression(callee) {
            Expression::Identifier(id) => id.name.as_str(),
            Expression::StaticMemberExpression(member) => member.property.name.as_str(),
            _ => return false,
        };
        self.helpers.iter().any(|h| h == name)
    }
}

impl ClassExprHandler for MergeCallHandler {
    fn name(&self) -> &'static str {
        "merge_call"
    }

    fn extract<'a>(&self, value: &ClassValue<'_, 'a>) -> Option<Extracted> {
        let ClassValue::Expr(expr) = value else {
            return None;
        };
        let Expression::CallExpression(call) = unwrap_expression(expr) else {
            return None;
        };
        if !self.is_helper(&call.callee) {
            return None;
        }

        let literals: Vec<String> = call
            .arguments
            .iter()
            .filter_map(|arg| arg.as_expression())
            .filter_map(static_string)
            .map(str::to_string)
            .collect();

        Some(Extracted::new(ClassExprKind::MergeCall, literals.join(" ")))
    }
}

/// Template literal with holes: static segments only.
///
/// A token glued to a hole (`p-${size}`) is a fragment, not a class, and is
/// dropped together with the hole.
pub struct TemplateHandler;

impl ClassExprHandler for TemplateHandler {
    fn name(&self) -> &'static str {
        "template"
    }

    fn extract<'a>(&self, value: &ClassValue<'_, 'a>) -> Option<Extracted> {
        let ClassValue::Expr(expr) = value else {
            return None;
        };
        let Expression::TemplateLiteral(tpl) = unwrap_expression(expr) else {
            return None;
        };

        let last = tpl.quasis.len().saturating_sub(1);
        let mut tokens: Vec<&str> = Vec::new();
        for (i, quasi) in tpl.quasis.iter().enumerate() {
            let text = quasi
                .value
                .cooked
                .as_ref()
                .map(|c| c.as_str())
                .unwrap_or_else(|| quasi.value.raw.as_str());
            let hole_before = i > 0;
            let hole_after = i < last;
            tokens.extend(static_segment_tokens(text, hole_before, hole_after));
        }

        Some(Extracted::new(ClassExprKind::Template, tokens.join(" ")))
    }
}

/// Whole tokens of a template segment, minus fragments touching a hole.
fn static_segment_tokens(text: &str, hole_before: bool, hole_after: bool) -> Vec<&str> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    let glued_front = hole_before && !text.starts_with(char::is_whitespace);
    let glued_back = hole_after && !text.ends_with(char::is_whitespace);
    if glued_back && !tokens.is_empty() {
        tokens.pop();
    }
    if glued_front && !tokens.is_empty() {
        tokens.remove(0);
    }
    tokens
}

/// String value of a literal-like expression (`"x"`, `` `x` ``).
pub(crate) fn static_string<'s>(expr: &'s Expression<'_>) -> Option<&'s str> {
    match unwrap_expression(expr) {
        Expression::StringLiteral(lit) => Some(lit.value.as_str()),
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() && tpl.quasis.len() == 1 => {
            let quasi = &tpl.quasis[0];
            Some(
                quasi
                    .value
                    .cooked
                    .as_ref()
                    .map(|c| c.as_str())
                    .unwrap_or_else(|| quasi.value.raw.as_str()),
            )
        }
        _ => None,
    }
}

/// Handlers tried in order; first match wins.
pub struct HandlerChain {
    handlers: Vec<Box<dyn ClassExprHandler>>,
}

impl HandlerChain {
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Literal, merge-helper call, template literal.
    pub fn standard(merge_helpers: &[String]) -> Self {
        Self::empty()
            .with(LiteralHandler)
            .with(MergeCallHandler::new(merge_helpers))
            .with(TemplateHandler)
    }

    pub fn with(mut self, handler: impl ClassExprHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn evaluate(&self, value: &ClassValue<'_, '_>) -> Extracted {
        self.handlers
            .iter()
            .find_map(|handler| {
                let extracted = handler.extract(value)?;
                trace!("class value taken by `{}` handler", handler.name());
                Some(extracted)
            })
            .unwrap_or_else(Extracted::dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn helpers() -> Vec<String> {
        vec!["cn".to_string(), "merge".to_string()]
    }

    /// Evaluate the expression `src` through the standard chain.
    fn eval(src: &str) -> Extracted {
        let allocator = Allocator::default();
        let expr = Parser::new(&allocator, src, SourceType::tsx())
            .parse_expression()
            .expect("expression parses");
        HandlerChain::standard(&helpers()).evaluate(&ClassValue::Expr(&expr))
    }

    #[test]
    fn test_attribute_string() {
        let chain = HandlerChain::standard(&helpers());
        let out = chain.evaluate(&ClassValue::Str("flex gap-2"));
        assert_eq!(out, Extracted::new(ClassExprKind::Literal, "flex gap-2"));
    }

    #[test]
    fn test_braced_string_and_plain_template() {
        assert_eq!(eval(r#""p-4 m-2""#).kind, ClassExprKind::Literal);
        assert_eq!(eval("`p-4 m-2`").text, "p-4 m-2");
        assert_eq!(eval(r#"("p-4")"#).text, "p-4");
    }

    #[test]
    fn test_merge_call_drops_dynamic_arguments() {
        let out = eval(r#"merge("flex", isActive && "bg-primary")"#);
        assert_eq!(out, Extracted::new(ClassExprKind::MergeCall, "flex"));

        let out = eval(r#"cn("flex gap-2", `items-center`, variant, cond ? "a" : "b")"#);
        assert_eq!(out.text, "flex gap-2 items-center");
    }

    #[test]
    fn test_unknown_callee_is_dynamic() {
        let out = eval(r#"buildClasses("flex")"#);
        assert_eq!(out, Extracted::dynamic());
    }

    #[test]
    fn test_member_callee_helper() {
        let out = eval(r#"utils.cn("flex")"#);
        assert_eq!(out.kind, ClassExprKind::MergeCall);
        assert_eq!(out.text, "flex");
    }

    #[test]
    fn test_template_keeps_static_segments() {
        let out = eval("`flex ${active ? 'ring' : ''} gap-2`");
        assert_eq!(out, Extracted::new(ClassExprKind::Template, "flex gap-2"));
    }

    #[test]
    fn test_template_drops_fragments_glued_to_holes() {
        let out = eval("`flex p-${size} items-center`");
        assert_eq!(out.text, "flex items-center");

        let out = eval("`${base}-card rounded`");
        assert_eq!(out.text, "rounded");
    }

    #[test]
    fn test_identifier_is_dynamic() {
        assert_eq!(eval("styles.root"), Extracted::dynamic());
        assert_eq!(eval("className"), Extracted::dynamic());
    }

    #[test]
    fn test_custom_handler_plugs_in() {
        struct Upper;
        impl ClassExprHandler for Upper {
            fn name(&self) -> &'static str {
                "upper"
            }
            fn extract<'a>(&self, value: &ClassValue<'_, 'a>) -> Option<Extracted> {
                match value {
                    ClassValue::Str(s) => Some(Extracted::new(
                        ClassExprKind::Literal,
                        s.to_uppercase(),
                    )),
                    ClassValue::Expr(_) => None,
                }
            }
        }
        let chain = HandlerChain::empty().with(Upper).with(LiteralHandler);
        assert_eq!(chain.evaluate(&ClassValue::Str("flex")).text, "FLEX");
        let reversed = HandlerChain::empty().with(LiteralHandler).with(Upper);
        assert_eq!(reversed.evaluate(&ClassValue::Str("flex")).text, "flex");
    }
}
