//! Command dispatch logic for daymerge
use std::time::Instant;

use crate::cli::{Cli, Commands};
use crate::commands;
use daymerge_core::config::RunConfig;
use daymerge_core::context::RunContext;
use daymerge_core::error::Result;

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let config = RunConfig::resolve(cli.config.as_deref(), cli.overrides())?;
    let ctx = RunContext::from_config(&config);

    tracing::debug!(
        notes_dir = %ctx.notes_dir.display(),
        output_dir = %ctx.output_dir.display(),
        quarter = ctx.quarter.as_deref(),
        jobs = ctx.jobs,
        elapsed = ?start.elapsed(),
        "resolve_config"
    );

    match cli.command.unwrap_or(Commands::Merge) {
        Commands::Merge => commands::merge::execute(cli, &ctx),
        Commands::List => commands::list::execute(cli, &ctx),
        Commands::Check => commands::check::execute(cli, &ctx),
    }
}
