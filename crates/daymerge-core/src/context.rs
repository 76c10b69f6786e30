//! Resolved locations and settings shared by every stage of a run

use std::fs;
use std::path::{Path, PathBuf};

use crate::assemble::HeadingStyle;
use crate::config::{expand_home, RunConfig};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{MergeError, Result};
use crate::images::SearchPolicy;

/// Asset directory name, relative to the output directory and to links in the merged document
pub const ASSETS_DIR: &str = "_assets";
pub const COMBINED_FILE: &str = "combined_notes.md";
pub const MANIFEST_FILE: &str = "processed_files.txt";

/// Everything a run needs to know about where to read and write.
///
/// Built once from a [`RunConfig`] and passed by reference to the pipeline;
/// no component looks paths up on its own.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub notes_dir: PathBuf,
    /// Canonical `2025Q1` form
    pub quarter: Option<String>,
    pub output_dir: PathBuf,
    /// `<output_dir>/_assets`, the only directory workers write into
    pub assets_dir: PathBuf,
    pub heading_style: HeadingStyle,
    pub search_policy: SearchPolicy,
    pub jobs: usize,
}

impl RunContext {
    pub fn new(notes_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            notes_dir: notes_dir.into(),
            quarter: None,
            assets_dir: output_dir.join(ASSETS_DIR),
            output_dir,
            heading_style: HeadingStyle::default(),
            search_policy: SearchPolicy::default(),
            jobs: default_jobs(),
        }
    }

    /// Context for a validated config, with `~` expanded in both directories
    pub fn from_config(config: &RunConfig) -> Self {
        let mut ctx = Self::new(
            expand_home(&config.notes_dir),
            expand_home(&config.output_dir),
        );
        ctx.quarter = config.quarter.clone();
        ctx.heading_style = config.heading_style;
        ctx.search_policy = config.image_search;
        if let Some(jobs) = config.jobs {
            ctx.jobs = jobs.max(1);
        }
        ctx
    }

    pub fn with_quarter(mut self, quarter: impl Into<String>) -> Self {
        self.quarter = Some(quarter.into());
        self
    }

    pub fn with_heading_style(mut self, style: HeadingStyle) -> Self {
        self.heading_style = style;
        self
    }

    pub fn with_search_policy(mut self, policy: SearchPolicy) -> Self {
        self.search_policy = policy;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn combined_path(&self) -> PathBuf {
        self.output_dir.join(COMBINED_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE)
    }

    /// `<notes_dir>/Notes <quarter>`, when a quarter is configured
    pub fn quarter_dir(&self) -> Option<PathBuf> {
        self.quarter
            .as_ref()
            .map(|q| self.notes_dir.join(format!("Notes {}", q)))
    }

    /// Directory to search for notes.
    ///
    /// `None` when the notes root is missing. A configured quarter whose
    /// directory is missing falls back to the notes root.
    pub fn discovery_root(&self, diagnostics: &mut Diagnostics) -> Option<PathBuf> {
        if !self.notes_dir.is_dir() {
            diagnostics.record(
                DiagnosticKind::NotesDirMissing,
                &self.notes_dir,
                "notes directory does not exist",
            );
            return None;
        }

        match self.quarter_dir() {
            Some(dir) if dir.is_dir() => Some(dir),
            Some(dir) => {
                diagnostics.record(
                    DiagnosticKind::QuarterDirMissing,
                    &dir,
                    "quarter directory does not exist; searching the whole notes directory",
                );
                Some(self.notes_dir.clone())
            }
            None => Some(self.notes_dir.clone()),
        }
    }

    /// Create the output and asset directories. Safe to call concurrently and repeatedly.
    pub fn prepare_output(&self) -> Result<()> {
        create_dir(&self.output_dir, "create output directory")?;
        create_dir(&self.assets_dir, "create asset directory")
    }
}

fn create_dir(path: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| MergeError::io_operation(operation, path.display(), e))
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
