//! CLI argument parsing for daymerge
//!
//! Directory flags fall back to the `NOTES_DIR`, `NOTES_QUARTER` and
//! `OUTPUT_DIR` environment variables, then to the config file.

pub mod output;
pub mod parse;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use daymerge_core::assemble::HeadingStyle;
use daymerge_core::config::ConfigOverrides;
use daymerge_core::images::SearchPolicy;
pub use output::OutputFormat;
use parse::{parse_heading_style, parse_search_policy};

/// Daymerge - merge dated daily notes and their images into one document
#[derive(Parser, Debug)]
#[command(name = "daymerge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true, env = "DAYMERGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory searched for `Notes <YYMMDD> <Weekday>.md` files
    #[arg(long, global = true, env = "NOTES_DIR")]
    pub notes_dir: Option<PathBuf>,

    /// Quarter to merge, e.g. 2025Q1 (uses `Notes <QUARTER>` under the notes directory)
    #[arg(long, global = true, env = "NOTES_QUARTER")]
    pub quarter: Option<String>,

    /// Destination for the merged document, manifest and `_assets/`
    #[arg(long, global = true, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Date heading style: html or markdown
    #[arg(long, global = true, value_parser = parse_heading_style)]
    pub heading_style: Option<HeadingStyle>,

    /// Image search policy: explicit or subdirs
    #[arg(long, global = true, value_parser = parse_search_policy)]
    pub image_search: Option<SearchPolicy>,

    /// Worker threads for note processing
    #[arg(long, short, global = true)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Debug-level logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (overrides --verbose)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Command-line layer of the run configuration
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            notes_dir: self.notes_dir.clone(),
            quarter: self.quarter.clone(),
            output_dir: self.output_dir.clone(),
            heading_style: self.heading_style,
            image_search: self.image_search,
            jobs: self.jobs,
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Merge notes and copy their images (default)
    Merge,

    /// List dated notes in merge order without reading them
    List,

    /// Resolve every image without copying anything; exit 3 on any problem
    Check,
}
