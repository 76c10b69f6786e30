//! Note data structures for daymerge
//!
//! A note is one `Notes <YYMMDD> <Weekday>.md` file. It enters the pipeline
//! as a [`NoteRecord`] and leaves as an immutable [`ProcessedNote`].

pub mod date;
pub mod discovery;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{MergeError, Result};

pub use date::{extract_date, NoteDate};
pub use discovery::{discover_notes, is_note_filename};

/// A note file that has been read and dated
#[derive(Debug, Clone)]
pub struct NoteRecord {
    /// Path the note was discovered at
    pub source_path: PathBuf,
    /// Date and weekday label parsed from the filename
    pub date: NoteDate,
    /// Final path component, e.g. `Notes 250314 Friday.md`
    pub filename: String,
    /// File content as read, front matter included
    pub raw_content: String,
}

impl NoteRecord {
    /// Date the file, then read it.
    ///
    /// The filename is checked first so undated files are never opened.
    pub fn load(path: &Path) -> Result<Self> {
        let date = extract_date(path)?;
        let bytes = fs::read(path)
            .map_err(|e| MergeError::io_operation("read note", path.display(), e))?;

        Ok(NoteRecord {
            source_path: path.to_path_buf(),
            date,
            filename: file_name(path),
            raw_content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// A note after front matter removal, image rewriting and heading insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedNote {
    pub date: NaiveDate,
    pub filename: String,
    /// Date heading followed by the rewritten body
    pub content: String,
}

/// Per-note line of the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub filename: String,
    pub date: NaiveDate,
    pub source_path: PathBuf,
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
