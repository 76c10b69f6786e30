//! Candidate-location search for referenced images
//!
//! Candidates are tried in a fixed priority order and the first existing
//! file wins:
//!
//! 1. the target itself, when absolute
//! 2. `<note_dir>/<target>`
//! 3. `<note_dir>/images<quarter>/<target>`
//! 4. `<parent>/<target>`
//! 5. `<parent>/images/<target>`
//! 6. `<parent>/images<quarter>/<target>`
//! 7. `<note_dir>/<sub>/<target>` for each direct subdirectory, by name
//!    ([`SearchPolicy::Subdirectories`] only)
//!
//! `parent` is the directory above the note's directory. The quarter is the
//! configured one, or else the `Notes 2025Q1` tag found in the note's path,
//! lower-cased; quarter candidates are skipped when there is neither.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MergeError;

static QUARTER_IN_PATH: OnceLock<Regex> = OnceLock::new();

/// How far the resolver looks beyond the fixed candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchPolicy {
    /// Fixed candidate list only
    #[serde(rename = "explicit")]
    Explicit,
    /// Fixed list, then every direct subdirectory of the note's directory
    #[default]
    #[serde(rename = "subdirs")]
    Subdirectories,
}

impl FromStr for SearchPolicy {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "explicit" => Ok(SearchPolicy::Explicit),
            "subdirs" | "subdirectories" => Ok(SearchPolicy::Subdirectories),
            other => Err(MergeError::unsupported(
                "image search policy",
                other,
                "explicit, subdirs",
            )),
        }
    }
}

impl fmt::Display for SearchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPolicy::Explicit => write!(f, "explicit"),
            SearchPolicy::Subdirectories => write!(f, "subdirs"),
        }
    }
}

/// Outcome of searching for one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PathBuf),
    Missing { tried: Vec<PathBuf> },
}

/// Extract the lower-cased quarter tag (`2025q1`) from a `Notes 2025Q1` path component
pub fn quarter_from_path(path: &Path) -> Option<String> {
    let re = QUARTER_IN_PATH
        .get_or_init(|| Regex::new(r"(?i)Notes\s+(\d{4}Q\d)").expect("valid regex"));
    let path = path.to_string_lossy();
    re.captures(&path).map(|cap| cap[1].to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct ImageResolver {
    policy: SearchPolicy,
    quarter: Option<String>,
}

impl ImageResolver {
    /// `quarter` is the configured hint; when `None` it is derived per note
    pub fn new(policy: SearchPolicy, quarter: Option<&str>) -> Self {
        Self {
            policy,
            quarter: quarter.map(str::to_lowercase),
        }
    }

    /// Every location searched for `target`, highest priority first, without duplicates
    pub fn candidates(&self, note_path: &Path, target: &str) -> Vec<PathBuf> {
        let note_dir = note_path.parent().unwrap_or_else(|| Path::new(""));
        let quarter_dir = self
            .quarter
            .clone()
            .or_else(|| quarter_from_path(note_path))
            .map(|q| format!("images{}", q));

        let mut out = Vec::new();
        let target_path = Path::new(target);
        if target_path.is_absolute() {
            out.push(target_path.to_path_buf());
        }

        out.push(note_dir.join(target));
        if let Some(quarter_dir) = &quarter_dir {
            out.push(note_dir.join(quarter_dir).join(target));
        }

        if let Some(parent) = note_dir.parent() {
            out.push(parent.join(target));
            out.push(parent.join("images").join(target));
            if let Some(quarter_dir) = &quarter_dir {
                out.push(parent.join(quarter_dir).join(target));
            }
        }

        if self.policy == SearchPolicy::Subdirectories {
            for sub in subdirectories(note_dir) {
                out.push(sub.join(target));
            }
        }

        let mut seen = HashSet::new();
        out.retain(|p| seen.insert(p.clone()));
        out
    }

    /// First existing candidate for `target` referenced from `note_path`
    #[tracing::instrument(level = "debug", skip(self, note_path), fields(note = %note_path.display()))]
    pub fn resolve(&self, note_path: &Path, target: &str) -> Resolution {
        let tried = self.candidates(note_path, target);
        match tried.iter().find(|p| p.is_file()) {
            Some(found) => {
                tracing::debug!(found = %found.display(), "resolved image");
                Resolution::Found(found.clone())
            }
            None => Resolution::Missing { tried },
        }
    }
}

/// Direct subdirectories of `dir`, sorted by name. Unreadable directories yield none.
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut subs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subs.sort();
    subs
}
