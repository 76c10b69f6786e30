use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Run counters for structured logging.
///
/// Shared by every note worker; all operations are atomic and lock-free.
#[derive(Debug, Default)]
pub struct RunMetrics {
    /// Notes that made it through processing
    notes_processed: AtomicU64,
    /// Images copied into the asset directory
    assets_copied: AtomicU64,
    /// Total bytes written into the asset directory
    bytes_copied: AtomicU64,
    /// Image references with no candidate location
    images_missing: AtomicU64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_note(&self) {
        self.notes_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one materialized asset of `bytes` size
    pub fn record_asset(&self, bytes: u64) {
        self.assets_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_missing_image(&self) {
        self.images_missing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notes_processed(&self) -> u64 {
        self.notes_processed.load(Ordering::Relaxed)
    }

    pub fn assets_copied(&self) -> u64 {
        self.assets_copied.load(Ordering::Relaxed)
    }

    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied.load(Ordering::Relaxed)
    }

    pub fn images_missing(&self) -> u64 {
        self.images_missing.load(Ordering::Relaxed)
    }
}

/// Log run metrics at info level.
///
/// Usage:
/// ```rust,ignore
/// let metrics = RunMetrics::new();
/// // ... workers record into it ...
/// log_run_metrics!(&metrics, "merge");
/// ```
#[macro_export]
macro_rules! log_run_metrics {
    ($metrics:expr, $name:expr) => {
        tracing::info!(
            operation = $name,
            notes_processed = $metrics.notes_processed(),
            assets_copied = $metrics.assets_copied(),
            bytes_copied = $metrics.bytes_copied(),
            images_missing = $metrics.images_missing(),
            "run_metrics"
        );
    };
}

/// Helper macro for logging elapsed time at trace level.
///
/// Usage:
/// ```rust,ignore
/// let start = Instant::now();
/// // ... some work ...
/// trace_time!(start, "discover");
/// // Or with additional fields:
/// trace_time!(start, "process_notes", count = paths.len());
/// ```
#[macro_export]
macro_rules! trace_time {
    ($start:expr, $name:expr) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $name);
    };
    ($start:expr, $name:expr $(, $field:ident = $value:expr)*) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $($field = $value),*, $name);
    };
}

/// Initialize structured logging based on CLI arguments
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = match (verbose, log_level) {
        (true, None) => "daymerge=debug",
        (false, None) => "daymerge=warn",
        (_, Some(level)) => return init_with_level(level, log_json),
    };

    init_with_level(level, log_json)
}

fn init_with_level(level: &str, log_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // DAYMERGE_LOG overrides the CLI level, same as RUST_LOG
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("DAYMERGE_LOG"))
        .unwrap_or_else(|_| {
            EnvFilter::new(if level.contains('=') {
                level.to_string()
            } else {
                format!("daymerge={}", level)
            })
        });

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_span_events(
                        tracing_subscriber::fmt::format::FmtSpan::NEW
                            | tracing_subscriber::fmt::format::FmtSpan::CLOSE,
                    ),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}
