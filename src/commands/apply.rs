//! `apply` and `diff` - read a document and hand it to the engine

use anyhow::{Context as AnyhowContext, Result};
use apiclient::HttpTransport;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::Context;
use crate::cli::{ApplyArgs, DiffArgs, SourceArgs};
use crate::config::Config;
use crate::engine::differ::{TerminalReporter, print_report};
use crate::engine::{ApplyOptions, Applier};
use crate::error::ApplyError;
use crate::template;
use crate::ui;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let opts = ApplyOptions {
        variables: template::parse_vars(&args.source.set)?,
        dry_run: args.dry_run,
        show_diff: args.show_diff,
        force: args.force,
    };
    execute(ctx, &args.source, &opts)
}

/// Shorthand for `apply --dry-run --show-diff`
pub fn diff(ctx: &Context, args: DiffArgs) -> Result<()> {
    let opts = ApplyOptions {
        variables: template::parse_vars(&args.source.set)?,
        dry_run: true,
        show_diff: true,
        force: false,
    };
    execute(ctx, &args.source, &opts)
}

fn execute(ctx: &Context, source: &SourceArgs, opts: &ApplyOptions) -> Result<()> {
    let input = read_source(&source.file)?;

    let config = Config::load()?;
    let target = config.resolve(source.context.as_deref(), |key| std::env::var(key).ok())?;
    log::info!(
        "Applying {} to context '{}' ({})",
        source.file.display(),
        target.context,
        target.environment
    );

    let api = HttpTransport::new(&target.environment, &target.token)
        .with_context(|| format!("Invalid environment for context '{}'", target.context))?;
    let applier = Applier::new(&api).with_safety(target.safety);

    if !ctx.quiet && opts.dry_run {
        ui::info(&format!("Dry run against context '{}'", target.context));
    }

    let mut reporter = TerminalReporter::new(ctx.quiet);
    let report = match applier.apply(&input, opts, &mut reporter) {
        Ok(report) => report,
        Err(err) => {
            if err
                .downcast_ref::<ApplyError>()
                .is_some_and(ApplyError::is_input)
            {
                log::info!("Rejected before any API call; nothing was sent");
            }
            return Err(err);
        }
    };

    if report.is_empty() {
        ui::warn("Document declared no resources");
        return Ok(());
    }
    if !ctx.quiet {
        print_report(&report);
    }
    Ok(())
}

/// Read a document from a file, or stdin for `-`
fn read_source(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Could not read document from stdin")?;
        return Ok(buf);
    }
    fs::read(path).with_context(|| format!("Could not read {}", path.display()))
}
