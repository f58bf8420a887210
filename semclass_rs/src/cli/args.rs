//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::analyzer::runner::ContentFormat;

#[derive(Parser, Debug)]
#[command(name = "semclass")]
#[command(about = "Extract semantic CSS classes from JSX/TSX utility class lists")]
#[command(version)]
pub struct Cli {
    /// Config file (default: <root>/semclass.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root; patterns and output directories are relative to it
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// No spinner or status lines
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Full pass: stylesheets, rewritten sources and reports
    Extract(ExtractArgs),
    /// List elements with classes but no marker
    Check(CheckArgs),
    /// Duplicate and near-duplicate class sets
    Dups(DupsArgs),
    /// Reconstruct content samples into documents or a samples module
    Content(ContentArgs),
}

/// Input selection shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Glob of component files, relative to the root
    #[arg(long)]
    pub pattern: Option<String>,

    /// Named pattern from `[categories]` in the config
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub selection: Selection,

    /// Keep running and regenerate on change
    #[arg(long)]
    pub watch: bool,

    /// Compute everything, write nothing
    #[arg(long, conflicts_with = "watch")]
    pub dry_run: bool,

    #[arg(long)]
    pub json: bool,

    #[arg(long)]
    pub css_out: Option<PathBuf>,

    #[arg(long)]
    pub source_out: Option<PathBuf>,

    /// Marker attribute name
    #[arg(long)]
    pub marker: Option<String>,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub selection: Selection,

    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DupsArgs {
    #[command(flatten)]
    pub selection: Selection,

    #[arg(long)]
    pub json: bool,

    /// Minimum Jaccard/Dice score
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Maximum Levenshtein distance
    #[arg(long)]
    pub max_distance: Option<usize>,

    /// Show every cluster instead of the top ten
    #[arg(long)]
    pub all: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ContentFormatArg {
    Documents,
    Samples,
}

impl From<ContentFormatArg> for ContentFormat {
    fn from(value: ContentFormatArg) -> Self {
        match value {
            ContentFormatArg::Documents => ContentFormat::Documents,
            ContentFormatArg::Samples => ContentFormat::Samples,
        }
    }
}

#[derive(Args, Debug)]
pub struct ContentArgs {
    #[command(flatten)]
    pub selection: Selection,

    #[arg(long, value_enum, default_value = "documents")]
    pub format: ContentFormatArg,

    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub json: bool,
}
