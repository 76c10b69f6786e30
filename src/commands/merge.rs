//! `daymerge merge` command - the full run
//!
//! Writes `combined_notes.md`, `processed_files.txt` and `_assets/` under the
//! output directory. Per-note and per-image problems are reported but do not
//! change the exit status.

use crate::cli::{Cli, OutputFormat};
use daymerge_core::context::RunContext;
use daymerge_core::error::Result;
use daymerge_core::pipeline::{Pipeline, RunReport};

/// Execute the merge command
pub fn execute(cli: &Cli, ctx: &RunContext) -> Result<()> {
    let report = Pipeline::new(ctx).run()?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Human => {
            if !cli.quiet {
                print_summary(&report);
            }
        }
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "Merged {} note(s) into {}",
        report.notes.len(),
        report.combined_path.display()
    );
    println!("Copied {} image(s)", report.assets.len());
    println!("Manifest: {}", report.manifest_path.display());

    if !report.diagnostics.is_empty() {
        println!();
        println!("{} warning(s):", report.diagnostics.len());
        for diagnostic in report.diagnostics.iter() {
            println!("  {}", diagnostic);
        }
    }
}
