//! Recursive note discovery

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Filename prefix shared by every note file
pub const NOTE_PREFIX: &str = "Notes ";

/// Whether a bare filename looks like a note (`Notes *.md`).
///
/// This is the discovery glob only; dates are validated later so that
/// look-alike files show up as diagnostics instead of vanishing.
pub fn is_note_filename(name: &str) -> bool {
    name.starts_with(NOTE_PREFIX) && name.ends_with(".md")
}

/// Recursively collect note files under `root`, sorted by path.
///
/// The sort gives ties on the same date a stable, alphabetical order
/// through the rest of the pipeline. Entries that cannot be read are
/// recorded as `Read` diagnostics when they are note-named (a dangling
/// symlink) or directories (notes below them are lost).
#[tracing::instrument(skip(root, diagnostics), fields(root = %root.display()))]
pub fn discover_notes(root: &Path, diagnostics: &mut Diagnostics) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                record_walk_error(&e, diagnostics);
                continue;
            }
        };
        let is_note = entry.file_name().to_str().is_some_and(is_note_filename);
        if entry.file_type().is_file() && is_note {
            paths.push(entry.into_path());
        }
    }

    paths.sort();
    tracing::debug!(count = paths.len(), "discovered note files");
    paths
}

fn record_walk_error(error: &walkdir::Error, diagnostics: &mut Diagnostics) {
    let Some(path) = error.path() else {
        tracing::debug!(error = %error, "skipping unreadable entry");
        return;
    };
    let note_named = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_note_filename);

    if note_named || path.is_dir() {
        diagnostics.record(DiagnosticKind::Read, path, error.to_string());
    } else {
        tracing::debug!(error = %error, path = %path.display(), "skipping unreadable entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_note_filename() {
        assert!(is_note_filename("Notes 250314 Friday.md"));
        assert!(is_note_filename("Notes draft.md"));
        assert!(!is_note_filename("Notes 250314 Friday.txt"));
        assert!(!is_note_filename("MyNotes 250314 Friday.md"));
        assert!(!is_note_filename("README.md"));
    }

    #[test]
    fn test_discovers_nested_notes_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Notes 2025Q1/February")).unwrap();
        fs::create_dir_all(root.join("Notes 2025Q1/January")).unwrap();
        fs::write(root.join("Notes 2025Q1/February/Notes 250203 Monday.md"), "b").unwrap();
        fs::write(root.join("Notes 2025Q1/January/Notes 250102 Thursday.md"), "a").unwrap();
        fs::write(root.join("Notes 250101 Wednesday.md"), "top").unwrap();
        fs::write(root.join("Notes 2025Q1/January/todo.md"), "ignored").unwrap();
        fs::write(root.join("Notes 2025Q1/January/photo.png"), "ignored").unwrap();

        let found = discover_notes(root, &mut Diagnostics::new());
        let relative: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("Notes 2025Q1/February/Notes 250203 Monday.md"),
                PathBuf::from("Notes 2025Q1/January/Notes 250102 Thursday.md"),
                PathBuf::from("Notes 250101 Wednesday.md"),
            ]
        );
    }

    #[test]
    fn test_directories_named_like_notes_are_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Notes archive.md")).unwrap();

        assert!(discover_notes(dir.path(), &mut Diagnostics::new()).is_empty());
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let dir = tempdir().unwrap();
        let mut diagnostics = Diagnostics::new();
        assert!(discover_notes(&dir.path().join("absent"), &mut diagnostics).is_empty());
        assert!(diagnostics.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_note_symlink_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Notes 250102 Thursday.md"), "ok").unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("gone.md"),
            dir.path().join("Notes 250101 Wednesday.md"),
        )
        .unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.png"), dir.path().join("stale.png"))
            .unwrap();

        let mut diagnostics = Diagnostics::new();
        let found = discover_notes(dir.path(), &mut diagnostics);

        assert_eq!(found, vec![dir.path().join("Notes 250102 Thursday.md")]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::Read), 1);
        assert_eq!(
            diagnostics.iter().next().unwrap().path,
            dir.path().join("Notes 250101 Wednesday.md")
        );
    }
}
