//! Date extraction from `Notes <YYMMDD> <Weekday>.md` filenames

use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{MergeError, Result};

static NOTE_FILENAME: OnceLock<Regex> = OnceLock::new();

fn note_filename_pattern() -> &'static Regex {
    NOTE_FILENAME.get_or_init(|| {
        Regex::new(r"^Notes (\d{2})(\d{2})(\d{2}) (\w+)\.md$").expect("valid regex")
    })
}

/// Calendar date and weekday label carried by a note filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDate {
    pub date: NaiveDate,
    /// Weekday as written in the filename, e.g. `Friday`
    pub weekday_label: String,
}

impl NoteDate {
    /// Whether the label names the weekday the date actually falls on.
    ///
    /// Accepts the full English name or its three-letter abbreviation,
    /// case-insensitively.
    pub fn weekday_matches(&self) -> bool {
        let full = self.date.format("%A").to_string();
        let short = self.date.format("%a").to_string();
        self.weekday_label.eq_ignore_ascii_case(&full)
            || self.weekday_label.eq_ignore_ascii_case(&short)
    }
}

/// Parse the date out of a note path. Only the final component is examined.
///
/// The two-digit year is read as `2000 + YY`. Names that do not follow the
/// convention, and digits that do not form a calendar date, are rejected.
pub fn extract_date(path: &Path) -> Result<NoteDate> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MergeError::invalid_filename(path.display().to_string(), "no file name"))?;

    let caps = note_filename_pattern()
        .captures(filename)
        .ok_or_else(|| {
            MergeError::invalid_filename(filename, "expected `Notes <YYMMDD> <Weekday>.md`")
        })?;

    // Two ASCII digits each, always parseable
    let yy: i32 = caps[1].parse().unwrap_or_default();
    let mm: u32 = caps[2].parse().unwrap_or_default();
    let dd: u32 = caps[3].parse().unwrap_or_default();

    let date = NaiveDate::from_ymd_opt(2000 + yy, mm, dd).ok_or_else(|| {
        MergeError::invalid_filename(
            filename,
            format!("20{}-{}-{} is not a calendar date", &caps[1], &caps[2], &caps[3]),
        )
    })?;

    Ok(NoteDate {
        date,
        weekday_label: caps[4].to_string(),
    })
}
