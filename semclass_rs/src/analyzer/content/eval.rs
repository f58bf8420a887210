//! Literal evaluator: rebuilds plain data from expression trees.
//!
//! The evaluator is total. Every node kind it does not model becomes
//! [`SampleValue::Unknown`]; unresolved identifiers become their own name as a
//! string; a constant that refers back to itself stops at the first repeat.
//! Nothing here returns an error.

use std::collections::{BTreeSet, HashMap};

use oxc_ast::ast::*;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use tracing::debug;

use crate::analyzer::unwrap_expression;
use crate::types::ByteSpan;

/// Plain data reconstructed from a literal expression.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<SampleValue>),
    /// Properties in source order, later spreads overwrite earlier keys in place
    Object(Vec<(String, SampleValue)>),
    /// Imported binding, kept by name
    Reference(String),
    Unknown,
}

impl SampleValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&SampleValue> {
        match self {
            Self::Object(props) => props.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Insert or replace, keeping the original position of an existing key.
    fn set(props: &mut Vec<(String, SampleValue)>, key: String, value: SampleValue) {
        match props.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => props.push((key, value)),
        }
    }

    /// Imported names referenced anywhere in the value.
    pub fn references(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Reference(name) => {
                out.insert(name.clone());
            }
            Self::Array(items) => items.iter().for_each(|v| v.references(out)),
            Self::Object(props) => props.iter().for_each(|(_, v)| v.references(out)),
            _ => {}
        }
    }
}

/// `Reference` serializes as its name, `Unknown` and non-finite numbers as null.
impl Serialize for SampleValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null | Self::Unknown => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) | Self::Reference(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(props) => {
                let mut map = serializer.serialize_map(Some(props.len()))?;
                for (k, v) in props {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// Import statement kept for the samples module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub statement: ByteSpan,
    /// Module specifier as written, unquoted
    pub specifier: String,
    /// Quoted specifier inside the statement
    pub source: ByteSpan,
}

/// Top-level bindings of one module: constants by name and imported names.
pub struct ModuleScope<'s, 'a> {
    consts: HashMap<&'s str, &'s Expression<'a>>,
    imports: Vec<ImportBinding>,
}

impl<'s, 'a> ModuleScope<'s, 'a> {
    /// First pass over the whole file, before any sample is evaluated.
    pub fn collect(program: &'s Program<'a>) -> Self {
        let mut scope = Self {
            consts: HashMap::new(),
            imports: Vec::new(),
        };

        for stmt in &program.body {
            match stmt {
                Statement::VariableDeclaration(var) => scope.add_declarations(var),
                Statement::ExportNamedDeclaration(export) => {
                    if let Some(Declaration::VariableDeclaration(var)) = &export.declaration {
                        scope.add_declarations(var);
                    }
                }
                Statement::ImportDeclaration(import) => {
                    let Some(specifiers) = &import.specifiers else {
                        continue;
                    };
                    for spec in specifiers {
                        let local = match spec {
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => &s.local,
                            ImportDeclarationSpecifier::ImportSpecifier(s) => &s.local,
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => &s.local,
                        };
                        scope.imports.push(ImportBinding {
                            local: local.name.to_string(),
                            statement: import.span.into(),
                            specifier: import.source.value.to_string(),
                            source: import.source.span.into(),
                        });
                    }
                }
                _ => {}
            }
        }
        scope
    }

    fn add_declarations(&mut self, var: &'s VariableDeclaration<'a>) {
        for decl in &var.declarations {
            if let BindingPattern::BindingIdentifier(id) = &decl.id
                && let Some(init) = &decl.init
            {
                self.consts.insert(id.name.as_str(), init);
            }
        }
    }

    pub fn is_import(&self, name: &str) -> bool {
        self.imports.iter().any(|i| i.local == name)
    }

    pub fn imports(&self) -> &[ImportBinding] {
        &self.imports
    }

    pub fn evaluator(&self) -> Evaluator<'_, 's, 'a> {
        Evaluator {
            scope: self,
            resolving: Vec::new(),
            resolved: HashMap::new(),
            cycle_cuts: 0,
        }
    }
}

pub struct Evaluator<'e, 's, 'a> {
    scope: &'e ModuleScope<'s, 'a>,
    /// Constants currently being expanded
    resolving: Vec<String>,
    /// Constants whose value does not depend on where expansion started
    resolved: HashMap<String, SampleValue>,
    /// Placeholders emitted so far for cyclic references
    cycle_cuts: usize,
}

impl Evaluator<'_, '_, '_> {
    pub fn eval(&mut self, expr: &Expression<'_>) -> SampleValue {
        match unwrap_expression(expr) {
            Expression::StringLiteral(lit) => SampleValue::String(lit.value.to_string()),
            Expression::NumericLiteral(lit) => SampleValue::Number(lit.value),
            Expression::BooleanLiteral(lit) => SampleValue::Bool(lit.value),
            Expression::NullLiteral(_) => SampleValue::Null,
            Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => {
                let text = tpl
                    .quasis
                    .iter()
                    .map(|q| {
                        q.value
                            .cooked
                            .as_ref()
                            .map(|c| c.as_str())
                            .unwrap_or_else(|| q.value.raw.as_str())
                    })
                    .collect::<String>();
                SampleValue::String(text)
            }
            Expression::UnaryExpression(unary)
                if unary.operator == UnaryOperator::UnaryNegation =>
            {
                match self.eval(&unary.argument) {
                    SampleValue::Number(n) => SampleValue::Number(-n),
                    _ => SampleValue::Unknown,
                }
            }
            Expression::ArrayExpression(arr) => self.eval_array(arr),
            Expression::ObjectExpression(obj) => self.eval_object(obj),
            Expression::Identifier(id) => self.resolve(id.name.as_str()),
            _ => SampleValue::Unknown,
        }
    }

    fn eval_array(&mut self, arr: &ArrayExpression<'_>) -> SampleValue {
        let mut items = Vec::with_capacity(arr.elements.len());
        for elem in &arr.elements {
            match elem {
                ArrayExpressionElement::SpreadElement(spread) => {
                    match self.eval(&spread.argument) {
                        SampleValue::Array(inner) => items.extend(inner),
                        _ => items.push(SampleValue::Null),
                    }
                }
                ArrayExpressionElement::Elision(_) => items.push(SampleValue::Null),
                _ => match elem.as_expression() {
                    Some(expr) => match self.eval(expr) {
                        SampleValue::Unknown => items.push(SampleValue::Null),
                        value => items.push(value),
                    },
                    None => items.push(SampleValue::Null),
                },
            }
        }
        SampleValue::Array(items)
    }

    fn eval_object(&mut self, obj: &ObjectExpression<'_>) -> SampleValue {
        let mut props: Vec<(String, SampleValue)> = Vec::with_capacity(obj.properties.len());
        for prop in &obj.properties {
            match prop {
                ObjectPropertyKind::ObjectProperty(p) => {
                    let Some(key) = property_key_name(&p.key) else {
                        continue;
                    };
                    let value = self.eval(&p.value);
                    SampleValue::set(&mut props, key, value);
                }
                ObjectPropertyKind::SpreadProperty(spread) => {
                    if let SampleValue::Object(inner) = self.eval(&spread.argument) {
                        for (k, v) in inner {
                            SampleValue::set(&mut props, k, v);
                        }
                    }
                }
            }
        }
        SampleValue::Object(props)
    }

    fn resolve(&mut self, name: &str) -> SampleValue {
        if name == "undefined" {
            return SampleValue::Null;
        }
        if let Some(value) = self.resolved.get(name) {
            return value.clone();
        }
        if self.resolving.iter().any(|n| n == name) {
            debug!("cyclic constant `{}`, using placeholder", name);
            self.cycle_cuts += 1;
            return SampleValue::String(name.to_string());
        }
        if let Some(init) = self.scope.consts.get(name).copied() {
            let cuts_before = self.cycle_cuts;
            self.resolving.push(name.to_string());
            let value = self.eval(init);
            self.resolving.pop();
            // A value with a cycle placeholder inside depends on the entry point.
            if self.cycle_cuts == cuts_before {
                self.resolved.insert(name.to_string(), value.clone());
            }
            return value;
        }
        if self.scope.is_import(name) {
            return SampleValue::Reference(name.to_string());
        }
        SampleValue::String(name.to_string())
    }

    pub(crate) fn is_resolved(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }
}

/// Static property key: `a`, `"a"`, `1`. Computed keys are skipped.
pub(crate) fn property_key_name(key: &PropertyKey<'_>) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
        PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
        PropertyKey::NumericLiteral(n) => Some(n.value.to_string()),
        _ => None,
    }
}
