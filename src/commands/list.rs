//! `daymerge list` command - dated notes in merge order
//!
//! Only filenames are examined; nothing is read or written.

use chrono::Datelike;
use serde::Serialize;

use crate::cli::{Cli, OutputFormat};
use daymerge_core::context::RunContext;
use daymerge_core::diagnostics::DiagnosticKind;
use daymerge_core::error::Result;
use daymerge_core::pipeline::Pipeline;

#[derive(Serialize)]
struct ListedNote<'a> {
    date: chrono::NaiveDate,
    weekday: String,
    filename: &'a str,
    path: String,
}

/// Execute the list command
pub fn execute(cli: &Cli, ctx: &RunContext) -> Result<()> {
    let plan = Pipeline::new(ctx).plan();

    match cli.format {
        OutputFormat::Json => {
            let notes: Vec<_> = plan
                .notes
                .iter()
                .map(|n| ListedNote {
                    date: n.date,
                    weekday: n.date.weekday().to_string(),
                    filename: &n.filename,
                    path: n.source_path.display().to_string(),
                })
                .collect();
            let output = serde_json::json!({
                "notes": notes,
                "diagnostics": plan.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            if plan.notes.is_empty() && !cli.quiet {
                println!("No notes found");
            }
            for note in &plan.notes {
                println!("{}  {}  {}", note.date, note.date.weekday(), note.filename);
            }

            if !cli.quiet {
                for diagnostic in plan.diagnostics.iter() {
                    if diagnostic.kind == DiagnosticKind::DateParse {
                        println!("skipped: {} ({})", diagnostic.path.display(), diagnostic.message);
                    } else {
                        println!("warning: {}", diagnostic);
                    }
                }
            }
        }
    }

    Ok(())
}
