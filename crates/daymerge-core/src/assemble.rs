//! Ordering, joining and normalizing processed notes

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::Datelike;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::note::{NoteDate, ProcessedNote};

/// Text placed between consecutive notes: one blank line
pub const NOTE_SEPARATOR: &str = "\n\n";

static CARRIAGE_RETURNS: OnceLock<Regex> = OnceLock::new();
static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

/// How the per-note date heading is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    /// `<div class="raw"><p class="date-box">Friday, March 14</p></div>`
    #[default]
    Html,
    /// `## Friday, March 14`
    Markdown,
}

impl FromStr for HeadingStyle {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(HeadingStyle::Html),
            "markdown" | "md" => Ok(HeadingStyle::Markdown),
            other => Err(MergeError::unsupported("heading style", other, "html, markdown")),
        }
    }
}

impl fmt::Display for HeadingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingStyle::Html => write!(f, "html"),
            HeadingStyle::Markdown => write!(f, "markdown"),
        }
    }
}

/// `Friday, March 14` in the requested style. The weekday comes from the filename label.
pub fn format_date_heading(date: &NoteDate, style: HeadingStyle) -> String {
    let text = format!(
        "{}, {} {}",
        date.weekday_label,
        date.date.format("%B"),
        date.date.day()
    );
    match style {
        HeadingStyle::Html => format!("<div class=\"raw\"><p class=\"date-box\">{}</p></div>", text),
        HeadingStyle::Markdown => format!("## {}", text),
    }
}

/// Date heading, a blank line, then the note body
pub fn compose_note(date: &NoteDate, body: &str, style: HeadingStyle) -> String {
    format!("{}\n\n{}", format_date_heading(date, style), body)
}

/// Normalize line endings and blank runs in merged text.
///
/// U+2028/U+2029 become `\n`, any run of `\r` before `\n` collapses into the
/// `\n`, and three or more consecutive newlines become exactly two. The
/// separator pass runs first so it cannot leave a fresh `\r\n` behind, which
/// keeps the function idempotent.
pub fn normalize(text: &str) -> String {
    let carriage_returns =
        CARRIAGE_RETURNS.get_or_init(|| Regex::new(r"\r+\n").expect("valid regex"));
    let blank_runs = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"));

    let separated: String = text
        .chars()
        .map(|c| match c {
            '\u{2028}' | '\u{2029}' => '\n',
            other => other,
        })
        .collect();
    let unix = carriage_returns.replace_all(&separated, "\n");
    blank_runs.replace_all(&unix, "\n\n").into_owned()
}

/// Merged document and its manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    pub text: String,
    /// `- <filename>` per note, merge order
    pub manifest: String,
}

/// Stable ascending sort by date; equal dates keep their incoming order
pub fn order_notes(notes: &mut [ProcessedNote]) {
    notes.sort_by_key(|note| note.date);
}

/// Join already-ordered notes and normalize the result
pub fn merge(notes: &[ProcessedNote]) -> String {
    let joined = notes
        .iter()
        .map(|note| note.content.as_str())
        .collect::<Vec<_>>()
        .join(NOTE_SEPARATOR);
    normalize(&joined)
}

pub fn manifest(notes: &[ProcessedNote]) -> String {
    notes
        .iter()
        .map(|note| format!("- {}", note.filename))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Order `notes` in place, then build the merged document and manifest
#[tracing::instrument(skip(notes), fields(count = notes.len()))]
pub fn assemble(notes: &mut [ProcessedNote]) -> MergedDocument {
    order_notes(notes);
    MergedDocument {
        text: merge(notes),
        manifest: manifest(notes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn note(y: i32, m: u32, d: u32, filename: &str, content: &str) -> ProcessedNote {
        ProcessedNote {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            filename: filename.to_string(),
            content: content.to_string(),
        }
    }

    fn friday() -> NoteDate {
        NoteDate {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            weekday_label: "Friday".to_string(),
        }
    }

    #[test]
    fn test_html_heading() {
        assert_eq!(
            format_date_heading(&friday(), HeadingStyle::Html),
            "<div class=\"raw\"><p class=\"date-box\">Friday, March 14</p></div>"
        );
    }

    #[test]
    fn test_markdown_heading_has_unpadded_day() {
        let date = NoteDate {
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            weekday_label: "Thursday".to_string(),
        };
        assert_eq!(
            format_date_heading(&date, HeadingStyle::Markdown),
            "## Thursday, January 2"
        );
    }

    #[test]
    fn test_compose_note() {
        assert_eq!(
            compose_note(&friday(), "Body\n", HeadingStyle::Markdown),
            "## Friday, March 14\n\nBody\n"
        );
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize("a\r\nb\r\n"), "a\nb\n");
        assert_eq!(normalize("a\u{2028}b\u{2029}c"), "a\nb\nc");
        assert_eq!(normalize("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\r\n\r\n\r\nb"), "a\n\nb");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "",
            "plain",
            "a\r\r\nb",
            "a\r\u{2028}b",
            "\r\n\r\n\r\n",
            "x\u{2029}\u{2029}\u{2029}y",
            "lone\rcarriage\r",
            "mixed\r\n\n\u{2028}\r\n\r\n\n\nend\n\n\n",
            "\n\n\n\n",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
            assert!(!once.contains("\n\n\n"));
            assert!(!once.contains("\r\n"));
            assert!(!once.contains('\u{2028}') && !once.contains('\u{2029}'));
        }
    }

    #[test]
    fn test_orders_by_date_regardless_of_input_order() {
        let mut notes = vec![
            note(2025, 1, 2, "Notes 250102 Thursday.md", "second"),
            note(2025, 1, 1, "Notes 250101 Wednesday.md", "first"),
            note(2025, 1, 3, "Notes 250103 Friday.md", "third"),
        ];
        let merged = assemble(&mut notes);

        assert_eq!(merged.text, "first\n\nsecond\n\nthird");
        assert_eq!(
            merged.manifest,
            "- Notes 250101 Wednesday.md\n- Notes 250102 Thursday.md\n- Notes 250103 Friday.md"
        );
    }

    #[test]
    fn test_same_date_keeps_incoming_order() {
        let mut notes = vec![
            note(2025, 1, 2, "b/Notes 250102 Thursday.md", "from b"),
            note(2025, 1, 1, "Notes 250101 Wednesday.md", "first"),
            note(2025, 1, 2, "a/Notes 250102 Thursday.md", "from a"),
        ];
        order_notes(&mut notes);

        let contents: Vec<_> = notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "from b", "from a"]);
    }

    #[test]
    fn test_trailing_newlines_still_give_one_blank_line() {
        let mut notes = vec![
            note(2025, 1, 1, "one.md", "one\n\n\n"),
            note(2025, 1, 2, "two.md", "two\n"),
        ];
        assert_eq!(assemble(&mut notes).text, "one\n\ntwo\n");
    }

    #[test]
    fn test_empty_merge() {
        let mut notes: Vec<ProcessedNote> = Vec::new();
        let merged = assemble(&mut notes);
        assert_eq!(merged.text, "");
        assert_eq!(merged.manifest, "");
    }

    #[test]
    fn test_heading_style_parse() {
        assert_eq!("HTML".parse::<HeadingStyle>().unwrap(), HeadingStyle::Html);
        assert_eq!("md".parse::<HeadingStyle>().unwrap(), HeadingStyle::Markdown);
        assert!("latex".parse::<HeadingStyle>().is_err());
    }
}
