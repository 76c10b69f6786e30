//! Structured diagnostics collected during a run
//!
//! Every recoverable failure (unparseable filename, unreadable note, missing
//! image, failed copy) is recorded here instead of aborting the run. The
//! collector travels back to the caller inside the run report.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Category of a recorded diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Filename does not match `Notes <YYMMDD> <Weekday>.md`; note dropped
    DateParse,
    /// Note file could not be read; note dropped
    Read,
    /// No candidate location holds the referenced image; reference untouched
    ImageNotFound,
    /// Copy into the asset directory failed; reference untouched
    AssetCopy,
    /// Weekday label in the filename disagrees with the encoded date
    WeekdayMismatch,
    /// Notes root does not exist; nothing to merge
    NotesDirMissing,
    /// `Notes <quarter>` directory missing; discovery fell back to the notes root
    QuarterDirMissing,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::DateParse => "date_parse",
            DiagnosticKind::Read => "read",
            DiagnosticKind::ImageNotFound => "image_not_found",
            DiagnosticKind::AssetCopy => "asset_copy",
            DiagnosticKind::WeekdayMismatch => "weekday_mismatch",
            DiagnosticKind::NotesDirMissing => "notes_dir_missing",
            DiagnosticKind::QuarterDirMissing => "quarter_dir_missing",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recoverable problem observed during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// File the problem relates to (note, image or directory)
    pub path: PathBuf,
    pub message: String,
    /// Raw markdown of the image reference, for image diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Candidate locations searched, for `ImageNotFound`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tried: Vec<PathBuf>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
            reference: None,
            tried: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_tried(mut self, tried: Vec<PathBuf>) -> Self {
        self.tried = tried;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.kind, self.path.display(), self.message)
    }
}

/// Collector for diagnostics, one per note task and one per run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it as a warning event
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = %diagnostic.kind,
            path = %diagnostic.path.display(),
            reference = diagnostic.reference.as_deref(),
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    /// Shorthand for `push(Diagnostic::new(..))`
    pub fn record(&mut self, kind: DiagnosticKind, path: &Path, message: impl Into<String>) {
        self.push(Diagnostic::new(kind, path, message));
    }

    /// Append another collector without re-emitting its events
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of diagnostics of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_by_kind() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(DiagnosticKind::ImageNotFound, Path::new("a.md"), "x.png");
        diagnostics.record(DiagnosticKind::ImageNotFound, Path::new("b.md"), "y.png");
        diagnostics.record(DiagnosticKind::DateParse, Path::new("c.md"), "bad name");

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.count(DiagnosticKind::ImageNotFound), 2);
        assert_eq!(diagnostics.count(DiagnosticKind::AssetCopy), 0);
    }

    #[test]
    fn test_extend_preserves_order() {
        let mut run = Diagnostics::new();
        run.record(DiagnosticKind::Read, Path::new("first.md"), "denied");

        let mut note = Diagnostics::new();
        note.record(DiagnosticKind::AssetCopy, Path::new("second.png"), "disk full");
        run.extend(note);

        let kinds: Vec<_> = run.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Read, DiagnosticKind::AssetCopy]);
    }

    #[test]
    fn test_serializes_snake_case_kind_and_skips_empty_fields() {
        let diagnostic = Diagnostic::new(DiagnosticKind::ImageNotFound, "n.md", "missing");
        let json = serde_json::to_value(&diagnostic).unwrap();

        assert_eq!(json["kind"], "image_not_found");
        assert!(json.get("reference").is_none());
        assert!(json.get("tried").is_none());
    }
}
