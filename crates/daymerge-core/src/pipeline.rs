//! The merge pipeline
//!
//! ```text
//! discover ──► [worker pool: load ─ strip ─ resolve ─ materialize ─ heading] ──► assemble ──► write
//! ```
//!
//! Notes are processed independently on a bounded pool of scoped threads.
//! Workers share only the asset directory, the [`AssetNamer`] and the
//! [`RunMetrics`]; assembly starts after every worker has joined.

use std::fs;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use serde::Serialize;

use crate::assemble::{assemble, compose_note};
use crate::context::RunContext;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{MergeError, Result};
use crate::images::materialize::rewrite_reference;
use crate::images::{
    AssetMaterializer, AssetNamer, ImageResolver, ReferenceExtractor, RegexExtractor, Resolution,
    ResolvedAsset,
};
use crate::logging::RunMetrics;
use crate::markdown::{strip_front_matter, DocumentParser, FrontmatterParser, MetadataKind};
use crate::note::{discover_notes, extract_date, NoteDate, NoteRecord, NoteSummary, ProcessedNote};
use crate::{log_run_metrics, trace_time};

/// Outcome of a full merge
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Merged notes in output order
    pub notes: Vec<NoteSummary>,
    /// Copied images, grouped by note in output order
    pub assets: Vec<ResolvedAsset>,
    pub diagnostics: Diagnostics,
    pub combined_path: PathBuf,
    pub manifest_path: PathBuf,
}

/// Outcome of a dry run that resolves images without copying them
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub notes: Vec<NoteSummary>,
    /// References that resolved to an existing file
    pub images_resolved: usize,
    pub diagnostics: Diagnostics,
}

/// Dated notes in merge order, without reading any of them
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub notes: Vec<NoteSummary>,
    pub diagnostics: Diagnostics,
}

/// Everything one worker produced for one note
#[derive(Debug, Default)]
struct NoteOutcome {
    note: Option<(NoteSummary, ProcessedNote)>,
    assets: Vec<ResolvedAsset>,
    images_resolved: usize,
    diagnostics: Diagnostics,
}

pub struct Pipeline<'a> {
    ctx: &'a RunContext,
    parser: Box<dyn DocumentParser>,
    extractor: Box<dyn ReferenceExtractor>,
    resolver: ImageResolver,
    strip_kind: MetadataKind,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with the built-in parser and extractor; strips YAML front matter
    pub fn new(ctx: &'a RunContext) -> Self {
        Self {
            ctx,
            parser: Box::new(FrontmatterParser),
            extractor: Box::new(RegexExtractor::new()),
            resolver: ImageResolver::new(ctx.search_policy, ctx.quarter.as_deref()),
            strip_kind: MetadataKind::Yaml,
        }
    }

    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_extractor(mut self, extractor: impl ReferenceExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Which front-matter block to drop from each note
    pub fn with_strip_kind(mut self, kind: MetadataKind) -> Self {
        self.strip_kind = kind;
        self
    }

    /// Merge every note, copy referenced images and write both output files.
    ///
    /// Only failing to create the output directories or to write the output
    /// files is an error; everything else is a diagnostic on the report.
    #[tracing::instrument(skip(self), fields(notes_dir = %self.ctx.notes_dir.display()))]
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        self.ctx.prepare_output()?;

        let mut diagnostics = Diagnostics::new();
        let paths = self.discover(&mut diagnostics);

        let namer = AssetNamer::new();
        let metrics = RunMetrics::new();
        let materializer = AssetMaterializer::new(&self.ctx.assets_dir, &namer, &metrics);
        let outcomes = run_workers(&paths, self.ctx.jobs, |path| {
            self.process_note(path, &metrics, Some(materializer))
        });
        trace_time!(start, "process_notes", count = paths.len());

        let (notes, mut processed, assets, _) = collect_outcomes(outcomes, &mut diagnostics);
        let merged = assemble(&mut processed);

        let combined_path = self.ctx.combined_path();
        let manifest_path = self.ctx.manifest_path();
        write_output(&combined_path, &merged.text)?;
        write_output(&manifest_path, &merged.manifest)?;

        log_run_metrics!(metrics, "merge");
        trace_time!(start, "merge", notes = notes.len(), diagnostics = diagnostics.len());

        Ok(RunReport {
            notes,
            assets,
            diagnostics,
            combined_path,
            manifest_path,
        })
    }

    /// Process every note without copying images or writing output
    #[tracing::instrument(skip(self), fields(notes_dir = %self.ctx.notes_dir.display()))]
    pub fn check(&self) -> CheckReport {
        let start = Instant::now();
        let mut diagnostics = Diagnostics::new();
        let paths = self.discover(&mut diagnostics);

        let metrics = RunMetrics::new();
        let outcomes = run_workers(&paths, self.ctx.jobs, |path| {
            self.process_note(path, &metrics, None)
        });
        let (notes, _, _, images_resolved) = collect_outcomes(outcomes, &mut diagnostics);

        log_run_metrics!(metrics, "check");
        trace_time!(start, "check", notes = notes.len(), diagnostics = diagnostics.len());

        CheckReport {
            notes,
            images_resolved,
            diagnostics,
        }
    }

    /// Discover and date notes in merge order. Files are not opened.
    pub fn plan(&self) -> Plan {
        let mut diagnostics = Diagnostics::new();
        let mut notes = Vec::new();
        for path in self.discover(&mut diagnostics) {
            match extract_date(&path) {
                Ok(date) => {
                    check_weekday(&date, &path, &mut diagnostics);
                    notes.push(summary(&path, &date));
                }
                Err(e) => diagnostics.record(DiagnosticKind::DateParse, &path, e.to_string()),
            }
        }
        notes.sort_by_key(|note| note.date);
        Plan { notes, diagnostics }
    }

    fn discover(&self, diagnostics: &mut Diagnostics) -> Vec<PathBuf> {
        let start = Instant::now();
        let paths = match self.ctx.discovery_root(diagnostics) {
            Some(root) => discover_notes(&root, diagnostics),
            None => Vec::new(),
        };
        tracing::debug!(count = paths.len(), "discovered notes");
        trace_time!(start, "discover");
        paths
    }

    #[tracing::instrument(skip(self, path, metrics, materializer), fields(note = %path.display()))]
    fn process_note(
        &self,
        path: &Path,
        metrics: &RunMetrics,
        materializer: Option<AssetMaterializer<'_>>,
    ) -> NoteOutcome {
        let mut outcome = NoteOutcome::default();
        let record = match NoteRecord::load(path) {
            Ok(record) => record,
            Err(e @ MergeError::InvalidFilename { .. }) => {
                outcome
                    .diagnostics
                    .record(DiagnosticKind::DateParse, path, e.to_string());
                return outcome;
            }
            Err(e) => {
                outcome
                    .diagnostics
                    .record(DiagnosticKind::Read, path, e.to_string());
                return outcome;
            }
        };
        check_weekday(&record.date, path, &mut outcome.diagnostics);

        let body = strip_front_matter(self.parser.as_ref(), &record.raw_content, self.strip_kind);
        let body = self.rewrite_images(path, &body, metrics, materializer, &mut outcome);
        let content = compose_note(&record.date, &body, self.ctx.heading_style);

        metrics.record_note();
        tracing::debug!(assets = outcome.assets.len(), "processed note");
        outcome.note = Some((
            summary(path, &record.date),
            ProcessedNote {
                date: record.date.date,
                filename: record.filename,
                content,
            },
        ));
        outcome
    }

    /// Replace each reference whose image was found and copied; leave the rest byte-for-byte
    fn rewrite_images(
        &self,
        note_path: &Path,
        body: &str,
        metrics: &RunMetrics,
        materializer: Option<AssetMaterializer<'_>>,
        outcome: &mut NoteOutcome,
    ) -> String {
        let mut out = String::with_capacity(body.len());
        let mut cursor = 0;

        for reference in self.extractor.extract(body) {
            if reference.is_remote() {
                continue;
            }
            let source = match self.resolver.resolve(note_path, &reference.original_path) {
                Resolution::Found(source) => source,
                Resolution::Missing { tried } => {
                    metrics.record_missing_image();
                    outcome.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::ImageNotFound,
                            note_path,
                            format!("image not found: {}", reference.original_path),
                        )
                        .with_reference(reference.raw_span.as_str())
                        .with_tried(tried),
                    );
                    continue;
                }
            };
            outcome.images_resolved += 1;

            let Some(materializer) = materializer else {
                continue;
            };
            match materializer.materialize(&source, reference.base_name()) {
                Ok(asset) => {
                    out.push_str(&body[cursor..reference.range.start]);
                    out.push_str(&rewrite_reference(&reference, &asset));
                    cursor = reference.range.end;
                    outcome.assets.push(asset);
                }
                Err(e) => outcome.diagnostics.push(
                    Diagnostic::new(DiagnosticKind::AssetCopy, &source, e.to_string())
                        .with_reference(reference.raw_span.as_str()),
                ),
            }
        }

        out.push_str(&body[cursor..]);
        out
    }
}

/// Run `work` over `paths` on at most `jobs` scoped threads.
///
/// Results come back in the order of `paths`. A panicking worker panics the caller.
fn run_workers<T, F>(paths: &[PathBuf], jobs: usize, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Path) -> T + Sync,
{
    if paths.is_empty() {
        return Vec::new();
    }

    let cursor = AtomicUsize::new(0);
    let workers = jobs.clamp(1, paths.len());
    let (cursor, work) = (&cursor, &work);

    let mut tagged: Vec<(usize, T)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let idx = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = paths.get(idx) else {
                            break;
                        };
                        done.push((idx, work(path.as_path())));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(done) => done,
                Err(payload) => panic::resume_unwind(payload),
            })
            .collect()
    });

    tagged.sort_by_key(|(idx, _)| *idx);
    tagged.into_iter().map(|(_, result)| result).collect()
}

type Collected = (Vec<NoteSummary>, Vec<ProcessedNote>, Vec<ResolvedAsset>, usize);

/// Fold worker outcomes (in discovery order) into date order, moving
/// diagnostics into the run collector
fn collect_outcomes(outcomes: Vec<NoteOutcome>, diagnostics: &mut Diagnostics) -> Collected {
    let mut pairs = Vec::with_capacity(outcomes.len());
    let mut assets = Vec::new();
    let mut images_resolved = 0;

    for outcome in outcomes {
        diagnostics.extend(outcome.diagnostics);
        images_resolved += outcome.images_resolved;
        if let Some((summary, note)) = outcome.note {
            pairs.push((summary, note, outcome.assets));
        }
    }

    pairs.sort_by_key(|(summary, _, _)| summary.date);

    let mut notes = Vec::with_capacity(pairs.len());
    let mut processed = Vec::with_capacity(pairs.len());
    for (summary, note, note_assets) in pairs {
        notes.push(summary);
        processed.push(note);
        assets.extend(note_assets);
    }
    (notes, processed, assets, images_resolved)
}

fn check_weekday(date: &NoteDate, path: &Path, diagnostics: &mut Diagnostics) {
    if !date.weekday_matches() {
        diagnostics.record(
            DiagnosticKind::WeekdayMismatch,
            path,
            format!(
                "weekday label {:?} does not match {} ({})",
                date.weekday_label,
                date.date,
                date.date.format("%A")
            ),
        );
    }
}

fn summary(path: &Path, date: &NoteDate) -> NoteSummary {
    NoteSummary {
        filename: crate::note::file_name(path),
        date: date.date,
        source_path: path.to_path_buf(),
    }
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| MergeError::io_operation("write", path.display(), e))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}
