//! Tree parser: one OXC allocator and parser per file.
//!
//! Nothing is shared between files. A syntax error fails only the file it
//! occurs in; callers log it and continue with the rest of the batch.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::error::{Result, SemclassError};

/// Pick the source type from the file extension.
///
/// Only enable JSX for .tsx/.jsx files to avoid conflicts with TypeScript generics
/// (e.g., `const fn = <T>(...) =>` would be parsed as JSX tag with JSX enabled).
pub fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let is_jsx_file = ext == "tsx" || ext == "jsx";
    SourceType::from_path(path)
        .unwrap_or_default()
        .with_typescript(true)
        .with_jsx(is_jsx_file)
}

/// Parse `source` into a program owned by `allocator`.
///
/// Recoverable diagnostics are treated as failures too: a half-parsed component
/// would produce half a stylesheet.
pub fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    path: &Path,
) -> Result<Program<'a>> {
    let ret = Parser::new(allocator, source, source_type_for(path)).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let first = ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "parser aborted".to_string());
        let message = if ret.errors.len() > 1 {
            format!("{} (+{} more)", first, ret.errors.len() - 1)
        } else {
            first
        };
        return Err(SemclassError::Parse {
            path: path.to_path_buf(),
            message,
        });
    }

    Ok(ret.program)
}
