//! Run configuration for daymerge
//!
//! Values come from three layers, highest priority first: command-line
//! flags and their environment variables (`NOTES_DIR`, `NOTES_QUARTER`,
//! `OUTPUT_DIR`), an optional TOML file, then built-in defaults.
//!
//! ```toml
//! notes_dir = "~/notes"
//! quarter = "2025Q1"
//! output_dir = "./output"
//! heading_style = "markdown"
//! image_search = "explicit"
//! jobs = 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::assemble::HeadingStyle;
use crate::error::{MergeError, Result};
use crate::images::SearchPolicy;

pub const DEFAULT_NOTES_DIR: &str = "~/notes";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

static QUARTER: OnceLock<Regex> = OnceLock::new();

/// Settings for one merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Root searched recursively for notes
    pub notes_dir: PathBuf,

    /// Quarter tag such as `2025Q1`; narrows discovery and hints image search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,

    /// Receives `combined_notes.md`, `processed_files.txt` and `_assets/`
    pub output_dir: PathBuf,

    pub heading_style: HeadingStyle,

    pub image_search: SearchPolicy,

    /// Worker threads for note processing (default: available parallelism)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            notes_dir: PathBuf::from(DEFAULT_NOTES_DIR),
            quarter: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            heading_style: HeadingStyle::default(),
            image_search: SearchPolicy::default(),
            jobs: None,
        }
    }
}

/// Values supplied on the command line; `None` leaves the lower layer alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub notes_dir: Option<PathBuf>,
    pub quarter: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub heading_style: Option<HeadingStyle>,
    pub image_search: Option<SearchPolicy>,
    pub jobs: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut RunConfig) {
        if let Some(notes_dir) = self.notes_dir {
            config.notes_dir = notes_dir;
        }
        if let Some(quarter) = self.quarter {
            config.quarter = Some(quarter);
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(heading_style) = self.heading_style {
            config.heading_style = heading_style;
        }
        if let Some(image_search) = self.image_search {
            config.image_search = image_search;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = Some(jobs);
        }
    }
}

impl RunConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| MergeError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| MergeError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Layer `overrides` over the file at `path` (or the defaults) and validate
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::load(path)?
            }
            None => Self::default(),
        };
        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could use and canonicalize the quarter to `2025Q1` form
    pub fn validate(&mut self) -> Result<()> {
        if self.jobs == Some(0) {
            return Err(MergeError::invalid_value("jobs (must be at least 1)", 0));
        }

        self.quarter = match self.quarter.take() {
            Some(quarter) if quarter.trim().is_empty() => None,
            Some(quarter) => {
                let quarter = quarter.trim();
                let re = QUARTER
                    .get_or_init(|| Regex::new(r"^\d{4}[Qq][1-4]$").expect("valid regex"));
                if !re.is_match(quarter) {
                    return Err(MergeError::invalid_value(
                        "quarter (expected e.g. 2025Q1)",
                        quarter,
                    ));
                }
                Some(quarter.to_uppercase())
            }
            None => None,
        };

        Ok(())
    }
}

/// Expand a leading `~` component to the home directory.
///
/// Paths that do not start with `~`, or a missing home directory, leave the
/// path unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
