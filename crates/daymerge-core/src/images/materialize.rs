//! Copying resolved images into the shared asset directory
//!
//! Names are `<stem>-<n>.<ext>` where `n` comes from one [`AssetNamer`]
//! per run, rendered in base 36. The counter alone makes names unique
//! within a run, across threads. Targets are opened with `create_new`, so
//! a file left by an earlier run is skipped instead of overwritten.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::reference::{ImageReference, ReferenceSyntax};
use crate::context::ASSETS_DIR;
use crate::error::{MergeError, Result};
use crate::logging::RunMetrics;

/// Upper bound on names tried when earlier runs left files behind
const MAX_NAME_ATTEMPTS: u32 = 4096;

/// An image copied into the asset directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAsset {
    pub source_path: PathBuf,
    /// File name inside the asset directory
    pub unique_name: String,
}

impl ResolvedAsset {
    /// Link target relative to the merged document
    pub fn link(&self) -> String {
        format!("{}/{}", ASSETS_DIR, self.unique_name)
    }
}

/// Run-scoped source of unique asset names
#[derive(Debug, Default)]
pub struct AssetNamer {
    next: AtomicU64,
}

impl AssetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A name no other call on this namer has returned
    pub fn next_name(&self, base_name: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        unique_name(base_name, n)
    }
}

/// Split at the final `.`; the extension may be empty
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx + 1..]),
        None => (name, ""),
    }
}

/// `stem-<n in base 36>.ext`, or `stem-<n>` without an extension
pub fn unique_name(base_name: &str, n: u64) -> String {
    let (stem, ext) = split_extension(base_name);
    let suffix = to_base36(n);
    if ext.is_empty() {
        format!("{}-{}", stem, suffix)
    } else {
        format!("{}-{}.{}", stem, suffix, ext)
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut buf = Vec::new();
    loop {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

/// Caption for a wiki embed: the file stem with a space before each
/// uppercase letter that follows a non-space character.
///
/// `MyPhoto.png` becomes `My Photo`.
pub fn caption_from_name(base_name: &str) -> String {
    let (stem, _) = split_extension(base_name);
    let mut caption = String::with_capacity(stem.len() + 4);
    let mut prev: Option<char> = None;
    for c in stem.chars() {
        if c.is_uppercase() && prev.is_some_and(|p| !p.is_whitespace()) {
            caption.push(' ');
        }
        caption.push(c);
        prev = Some(c);
    }
    caption.trim().to_string()
}

/// Markdown that replaces `reference` once its image lives at `asset`
pub fn rewrite_reference(reference: &ImageReference, asset: &ResolvedAsset) -> String {
    match &reference.syntax {
        ReferenceSyntax::Markdown { caption } => format!("![{}]({})", caption, asset.link()),
        ReferenceSyntax::Wiki => format!(
            "![{}]({})",
            caption_from_name(reference.base_name()),
            asset.link()
        ),
    }
}

/// Copies images into the run's asset directory
#[derive(Debug, Clone, Copy)]
pub struct AssetMaterializer<'a> {
    assets_dir: &'a Path,
    namer: &'a AssetNamer,
    metrics: &'a RunMetrics,
}

impl<'a> AssetMaterializer<'a> {
    pub fn new(assets_dir: &'a Path, namer: &'a AssetNamer, metrics: &'a RunMetrics) -> Self {
        Self {
            assets_dir,
            namer,
            metrics,
        }
    }

    /// Copy `source` into the asset directory under a fresh name derived from `base_name`.
    ///
    /// On failure nothing is left behind in the asset directory.
    #[tracing::instrument(skip(self, source), fields(source = %source.display()))]
    pub fn materialize(&self, source: &Path, base_name: &str) -> Result<ResolvedAsset> {
        let mut input = File::open(source)
            .map_err(|e| MergeError::io_operation("open image", source.display(), e))?;
        let (unique_name, target, mut output) = self.create_target(base_name)?;

        match io::copy(&mut input, &mut output) {
            Ok(bytes) => {
                self.metrics.record_asset(bytes);
                tracing::debug!(unique_name = %unique_name, bytes, "copied image");
                Ok(ResolvedAsset {
                    source_path: source.to_path_buf(),
                    unique_name,
                })
            }
            Err(e) => {
                drop(output);
                if let Err(cleanup) = fs::remove_file(&target) {
                    tracing::debug!(error = %cleanup, target = %target.display(), "failed to remove partial asset");
                }
                Err(MergeError::io_operation("copy image to", target.display(), e))
            }
        }
    }

    fn create_target(&self, base_name: &str) -> Result<(String, PathBuf, File)> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = self.namer.next_name(base_name);
            let target = self.assets_dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => return Ok((name, target, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::trace!(name = %name, "asset name taken by an earlier run");
                }
                Err(e) => {
                    return Err(MergeError::io_operation("create asset", target.display(), e))
                }
            }
        }
        Err(MergeError::io_operation(
            "allocate asset name for",
            base_name,
            "every candidate name already exists",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::reference::{ReferenceExtractor, RegexExtractor};
    use std::collections::HashSet;
    use std::thread;
    use tempfile::tempdir;

    fn asset(name: &str) -> ResolvedAsset {
        ResolvedAsset {
            source_path: PathBuf::from("/src").join(name),
            unique_name: name.to_string(),
        }
    }

    #[test]
    fn test_unique_name_shapes() {
        assert_eq!(unique_name("photo.png", 0), "photo-0.png");
        assert_eq!(unique_name("photo.png", 35), "photo-z.png");
        assert_eq!(unique_name("photo.png", 36), "photo-10.png");
        assert_eq!(unique_name("archive.tar.gz", 1), "archive.tar-1.gz");
        assert_eq!(unique_name("README", 2), "README-2");
    }

    #[test]
    fn test_namer_never_repeats() {
        let namer = AssetNamer::new();
        let names: HashSet<_> = (0..1000).map(|_| namer.next_name("cat.png")).collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_caption_from_name() {
        assert_eq!(caption_from_name("MyPhoto.png"), "My Photo");
        assert_eq!(caption_from_name("whiteboard.jpg"), "whiteboard");
        assert_eq!(caption_from_name("Pasted image 20250314.png"), "Pasted image 20250314");
        assert_eq!(caption_from_name("My Photo.png"), "My Photo");
        assert_eq!(caption_from_name("QuarterlyOKRReview.png"), "Quarterly O K R Review");
    }

    #[test]
    fn test_rewrite_markdown_keeps_caption() {
        let refs = RegexExtractor::new().extract("![Team *offsite* photo](img/offsite.jpg)");
        let rewritten = rewrite_reference(&refs[0], &asset("offsite-0.jpg"));
        assert_eq!(rewritten, "![Team *offsite* photo](_assets/offsite-0.jpg)");
    }

    #[test]
    fn test_rewrite_wiki_synthesizes_caption() {
        let refs = RegexExtractor::new().extract("![[shots/MyPhoto.png|400]]");
        let rewritten = rewrite_reference(&refs[0], &asset("MyPhoto-3.png"));
        assert_eq!(rewritten, "![My Photo](_assets/MyPhoto-3.png)");
    }

    #[test]
    fn test_materialize_copies_content() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("cat.png");
        fs::write(&source, b"\x89PNG data").unwrap();
        let assets = dir.path().join("_assets");
        fs::create_dir_all(&assets).unwrap();

        let (namer, metrics) = (AssetNamer::new(), RunMetrics::new());
        let materializer = AssetMaterializer::new(&assets, &namer, &metrics);
        let asset = materializer.materialize(&source, "cat.png").unwrap();

        assert_eq!(asset.unique_name, "cat-0.png");
        assert_eq!(fs::read(assets.join("cat-0.png")).unwrap(), b"\x89PNG data");
        assert_eq!(metrics.assets_copied(), 1);
        assert_eq!(metrics.bytes_copied(), 9);
    }

    #[test]
    fn test_existing_files_are_never_overwritten() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("cat.png");
        fs::write(&source, b"new").unwrap();
        let assets = dir.path().join("_assets");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("cat-0.png"), b"old").unwrap();

        let (namer, metrics) = (AssetNamer::new(), RunMetrics::new());
        let asset = AssetMaterializer::new(&assets, &namer, &metrics)
            .materialize(&source, "cat.png")
            .unwrap();

        assert_eq!(asset.unique_name, "cat-1.png");
        assert_eq!(fs::read(assets.join("cat-0.png")).unwrap(), b"old");
        assert_eq!(fs::read(assets.join("cat-1.png")).unwrap(), b"new");
    }

    #[test]
    fn test_concurrent_same_basename_names_are_distinct() {
        let dir = tempdir().unwrap();
        let assets = dir.path().join("_assets");
        fs::create_dir_all(&assets).unwrap();
        let sources: Vec<PathBuf> = (0..8)
            .map(|i| {
                let d = dir.path().join(format!("day{}", i));
                fs::create_dir_all(&d).unwrap();
                let p = d.join("image.png");
                fs::write(&p, format!("image {}", i)).unwrap();
                p
            })
            .collect();

        let (namer, metrics) = (AssetNamer::new(), RunMetrics::new());
        let materializer = AssetMaterializer::new(&assets, &namer, &metrics);
        let names: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .map(|source| {
                    scope.spawn(move || {
                        (0..25)
                            .map(|_| materializer.materialize(source, "image.png").unwrap().unique_name)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let distinct: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), 200);
        assert_eq!(distinct.len(), 200);
        assert_eq!(fs::read_dir(&assets).unwrap().count(), 200);
    }

    #[test]
    fn test_missing_source_leaves_no_file() {
        let dir = tempdir().unwrap();
        let assets = dir.path().join("_assets");
        fs::create_dir_all(&assets).unwrap();

        let (namer, metrics) = (AssetNamer::new(), RunMetrics::new());
        let result = AssetMaterializer::new(&assets, &namer, &metrics)
            .materialize(&dir.path().join("gone.png"), "gone.png");

        assert!(result.is_err());
        assert_eq!(fs::read_dir(&assets).unwrap().count(), 0);
        assert_eq!(metrics.assets_copied(), 0);
    }

    #[test]
    fn test_missing_asset_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("cat.png");
        fs::write(&source, b"x").unwrap();

        let (namer, metrics) = (AssetNamer::new(), RunMetrics::new());
        let result = AssetMaterializer::new(&dir.path().join("absent"), &namer, &metrics)
            .materialize(&source, "cat.png");

        assert!(matches!(result, Err(MergeError::FailedOperation { .. })));
    }
}
