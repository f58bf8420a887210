//! Command dispatcher: logging, configuration, then one handler per subcommand.
//!
//! Handlers return `anyhow::Result`. An `Err` here is always a run that could not
//! start (no pattern, unknown category, bad glob, watcher setup) and maps to exit
//! status 1. Per-file failures never reach this level.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::args::{CheckArgs, Cli, Command, ContentArgs, DupsArgs, ExtractArgs, Selection};
use super::output::{self, CoverageReport};
use crate::analyzer::runner::{self, Pipeline, RunOptions};
use crate::config::SemclassConfig;
use crate::progress::{self, Spinner};
use crate::watch::{self, WatchConfig};

/// Shared state resolved once per invocation
struct Invocation {
    root: PathBuf,
    config: SemclassConfig,
    quiet: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(&cli.log_level, cli.verbose);

    let root = cli.root.canonicalize().unwrap_or_else(|_| cli.root.clone());
    let config = match &cli.config {
        Some(path) => SemclassConfig::load_from_path(path),
        None => SemclassConfig::load(&root),
    };
    let ctx = Invocation {
        root,
        config,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Command::Extract(args) => run_extract(ctx, args),
        Command::Check(args) => run_check(ctx, args),
        Command::Dups(args) => run_dups(ctx, args),
        Command::Content(args) => run_content(ctx, args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            progress::error(&format!("{e:#}"));
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins; otherwise `--log-level`, raised to debug by `-v`.
fn init_tracing(log_level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { log_level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn resolve_pattern(ctx: &Invocation, selection: &Selection) -> anyhow::Result<String> {
    let pattern = ctx
        .config
        .resolve_pattern(selection.pattern.as_deref(), selection.category.as_deref())?;
    debug!("Input pattern: {}", pattern);
    Ok(pattern)
}

fn pipeline(ctx: Invocation, pattern: &str) -> anyhow::Result<Pipeline> {
    let root = ctx.root.clone();
    Pipeline::new(&root, ctx.config, pattern)
        .with_context(|| format!("cannot scan {}", root.display()))
}

fn print(text: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn run_extract(mut ctx: Invocation, args: ExtractArgs) -> anyhow::Result<()> {
    if let Some(dir) = args.css_out {
        ctx.config.css_out = dir;
    }
    if let Some(dir) = args.source_out {
        ctx.config.source_out = dir;
    }
    if let Some(marker) = args.marker {
        ctx.config.marker_attribute = marker;
    }
    let pattern = resolve_pattern(&ctx, &args.selection)?;
    let root = ctx.root.clone();
    let quiet = ctx.quiet || args.json;
    let pipeline = pipeline(ctx, &pattern)?;
    let json = args.json;

    if args.watch {
        let mut printed: anyhow::Result<()> = Ok(());
        watch::watch_and_regenerate(pipeline, WatchConfig::default(), |report| {
            let text = if json {
                output::to_json(report)
            } else {
                Ok(output::render_run(report, &root, false))
            };
            if let Err(e) = text.and_then(|t| print(&t)) {
                printed = Err(e);
            }
        })?;
        return printed;
    }

    let spinner = Spinner::new(&format!("Extracting `{pattern}`..."), !quiet);
    let report = pipeline.run(&RunOptions {
        dry_run: args.dry_run,
    });
    let status = format!(
        "{}, {}",
        progress::format_count(report.summary.files_scanned, "file", "files"),
        progress::format_count(report.summary.mappings, "mapping", "mappings")
    );
    let problems = report.summary.files_failed + report.summary.write_errors.len();
    if problems > 0 {
        spinner.finish_warning(&format!("{status}, {problems} with errors"));
    } else {
        spinner.finish_success(&status);
    }

    if json {
        print(&output::to_json(&report)?)
    } else {
        print(&output::render_run(&report, &root, false))
    }
}

fn run_check(ctx: Invocation, args: CheckArgs) -> anyhow::Result<()> {
    let pattern = resolve_pattern(&ctx, &args.selection)?;
    let quiet = ctx.quiet || args.json;
    let pipeline = pipeline(ctx, &pattern)?;

    let spinner = Spinner::new("Checking marker coverage...", !quiet);
    let analysis = pipeline.analyze();
    spinner.finish_clear();

    let report = CoverageReport {
        files_scanned: analysis.extractions.len() + analysis.failures.len(),
        files_failed: analysis.failures.len(),
        missing_markers: analysis.missing_markers(),
        failures: analysis.failures,
    };
    if args.json {
        print(&output::to_json(&report)?)
    } else {
        print(&output::render_coverage(&report))
    }
}

fn run_dups(mut ctx: Invocation, args: DupsArgs) -> anyhow::Result<()> {
    if let Some(threshold) = args.threshold {
        ctx.config.similarity.threshold = threshold;
    }
    if let Some(distance) = args.max_distance {
        ctx.config.similarity.max_distance = distance;
    }
    let pattern = resolve_pattern(&ctx, &args.selection)?;
    let quiet = ctx.quiet || args.json;
    let pipeline = pipeline(ctx, &pattern)?;

    let spinner = Spinner::new("Comparing class sets...", !quiet);
    let analysis = pipeline.analyze();
    let report = pipeline.duplicates(&analysis.store);
    spinner.finish_clear();

    if args.json {
        print(&output::to_json(&report)?)
    } else {
        print(&output::render_duplicates(&report, args.all))
    }
}

fn run_content(ctx: Invocation, args: ContentArgs) -> anyhow::Result<()> {
    let pattern = resolve_pattern(&ctx, &args.selection)?;
    let out_dir = args.out.as_deref().unwrap_or(&ctx.config.content.out);
    let out = SemclassConfig::resolve_out(&ctx.root, out_dir);
    let quiet = ctx.quiet || args.json;

    let spinner = Spinner::new("Reconstructing samples...", !quiet);
    let report = runner::run_content(
        &ctx.root,
        &ctx.config,
        &pattern,
        args.selection.category.as_deref(),
        args.format.into(),
        &out,
        &RunOptions {
            dry_run: args.dry_run,
        },
    )
    .with_context(|| format!("cannot scan {}", ctx.root.display()))?;
    spinner.finish_clear();

    if args.json {
        print(&output::to_json(&report)?)
    } else {
        print(&output::render_content(&report, &ctx.root, args.dry_run))
    }
}
