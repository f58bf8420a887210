//! # semclass
//!
//! Semantic class extraction for JSX/TSX components.
//!
//! Elements that carry a literal marker attribute
//! (`<div className="flex items-center gap-2" data-semantic="card-header">`) are
//! turned into named rules (`.card-header { @apply flex gap-2 items-center; }`),
//! and the component is rewritten to reference the name instead of the utility
//! list. Alongside, the tool reports elements that lack a marker and class sets
//! that are exact or near duplicates of each other.
//!
//! ## Pipeline
//!
//! ```text
//! walk ─▶ parse ─▶ extract ─▶ normalize ─┬─▶ merge ─▶ CSS / index
//!  (fs_utils)  (analyzer::jsx)           │          rewritten sources / index.ts
//!                                        ├─▶ coverage check
//!                                        └─▶ duplicate + similarity report
//! ```
//!
//! Per-file work runs in parallel and shares nothing; [`analyzer::runner`] does
//! the single reduce. A secondary pipeline ([`analyzer::content`]) reconstructs
//! literal sample data into document or module outputs.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod progress;
pub mod types;
pub mod watch;

pub use analyzer::{ClassSet, MappingStore, Pipeline, RunOptions};
pub use config::SemclassConfig;
pub use error::{Result, SemclassError};
