//! `semclass <command> [options]`
//!
//! - [`args`] - clap definitions (source of truth for flags)
//! - [`dispatch`] - logging/config setup and one handler per command
//! - [`output`] - text and JSON rendering of reports

pub mod args;
pub mod dispatch;
pub mod output;

pub use args::Cli;
pub use dispatch::run;
