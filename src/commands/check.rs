//! `daymerge check` command - dry run
//!
//! Reads every note and resolves every image reference, copies nothing and
//! writes nothing. Any recorded diagnostic makes the command exit with 3.

use crate::cli::{Cli, OutputFormat};
use daymerge_core::context::RunContext;
use daymerge_core::error::{MergeError, Result};
use daymerge_core::pipeline::Pipeline;

/// Execute the check command
pub fn execute(cli: &Cli, ctx: &RunContext) -> Result<()> {
    let report = Pipeline::new(ctx).check();

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Human => {
            for diagnostic in report.diagnostics.iter() {
                println!("{}", diagnostic);
                for tried in &diagnostic.tried {
                    println!("    tried {}", tried.display());
                }
            }
            if !cli.quiet {
                println!(
                    "Checked {} note(s), {} image(s) resolved, {} problem(s)",
                    report.notes.len(),
                    report.images_resolved,
                    report.diagnostics.len()
                );
            }
        }
    }

    if report.diagnostics.is_empty() {
        Ok(())
    } else {
        Err(MergeError::CheckFailed {
            count: report.diagnostics.len(),
        })
    }
}
