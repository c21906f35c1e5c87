use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::BindError;

use super::unified::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadSeverity {
    /// Read succeeded and every cell converted.
    Info,
    /// Read succeeded with unconvertible cells.
    Warning,
    /// Error-level event (read failed on sheet structure).
    Error,
    /// Critical error (I/O or other infrastructure failures).
    Critical,
}

/// Context about a read attempt.
#[derive(Debug, Clone)]
pub struct ReadContext {
    /// The source path.
    pub path: PathBuf,
    /// Format used for the read.
    pub format: SourceFormat,
    /// Sheet selector as given by the caller.
    pub selector: String,
}

/// Stats reported on a successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    /// Number of bound records.
    pub records: usize,
    /// Number of cells that failed to convert.
    pub errors: usize,
}

impl ReadStats {
    /// Severity of a successful read: [`ReadSeverity::Warning`] if any cell failed to
    /// convert, [`ReadSeverity::Info`] otherwise.
    pub fn severity(&self) -> ReadSeverity {
        if self.errors > 0 {
            ReadSeverity::Warning
        } else {
            ReadSeverity::Info
        }
    }
}

/// Observer interface for read outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait ReadObserver: Send + Sync {
    /// Called when a read succeeds, including reads with conversion errors.
    fn on_success(&self, _ctx: &ReadContext, _stats: ReadStats) {}

    /// Called after [`Self::on_success`] when the read's severity (see
    /// [`ReadStats::severity`]) meets the alert threshold.
    fn on_success_alert(&self, _ctx: &ReadContext, _severity: ReadSeverity, _stats: ReadStats) {}

    /// Called when a read fails.
    fn on_failure(&self, _ctx: &ReadContext, _severity: ReadSeverity, _error: &BindError) {}

    /// Called when a read failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ReadContext, severity: ReadSeverity, error: &BindError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ReadObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn ReadObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ReadObserver for CompositeObserver {
    fn on_success(&self, ctx: &ReadContext, stats: ReadStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_success_alert(&self, ctx: &ReadContext, severity: ReadSeverity, stats: ReadStats) {
        for o in &self.observers {
            o.on_success_alert(ctx, severity, stats);
        }
    }

    fn on_failure(&self, ctx: &ReadContext, severity: ReadSeverity, error: &BindError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &ReadContext, severity: ReadSeverity, error: &BindError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs read events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl ReadObserver for StdErrObserver {
    fn on_success(&self, ctx: &ReadContext, stats: ReadStats) {
        eprintln!(
            "[read][ok] format={:?} path={} sheet={} records={} errors={}",
            ctx.format,
            ctx.path.display(),
            ctx.selector,
            stats.records,
            stats.errors
        );
    }

    fn on_success_alert(&self, ctx: &ReadContext, severity: ReadSeverity, stats: ReadStats) {
        eprintln!(
            "[ALERT][read][{:?}] format={:?} path={} sheet={} records={} errors={}",
            severity,
            ctx.format,
            ctx.path.display(),
            ctx.selector,
            stats.records,
            stats.errors
        );
    }

    fn on_failure(&self, ctx: &ReadContext, severity: ReadSeverity, error: &BindError) {
        eprintln!(
            "[read][{:?}] format={:?} path={} sheet={} err={}",
            severity,
            ctx.format,
            ctx.path.display(),
            ctx.selector,
            error
        );
    }

    fn on_alert(&self, ctx: &ReadContext, severity: ReadSeverity, error: &BindError) {
        eprintln!(
            "[ALERT][read][{:?}] format={:?} path={} sheet={} err={}",
            severity,
            ctx.format,
            ctx.path.display(),
            ctx.selector,
            error
        );
    }
}

/// Forwards read events to `tracing`.
///
/// Successes with unconvertible cells are logged at `WARN`, failures at `ERROR`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ReadObserver for TracingObserver {
    fn on_success(&self, ctx: &ReadContext, stats: ReadStats) {
        if stats.errors > 0 {
            tracing::warn!(
                format = ?ctx.format,
                path = %ctx.path.display(),
                sheet = %ctx.selector,
                records = stats.records,
                errors = stats.errors,
                "read finished with conversion errors"
            );
        } else {
            tracing::info!(
                format = ?ctx.format,
                path = %ctx.path.display(),
                sheet = %ctx.selector,
                records = stats.records,
                "read finished"
            );
        }
    }

    fn on_success_alert(&self, ctx: &ReadContext, severity: ReadSeverity, stats: ReadStats) {
        tracing::warn!(
            ?severity,
            format = ?ctx.format,
            path = %ctx.path.display(),
            sheet = %ctx.selector,
            records = stats.records,
            errors = stats.errors,
            "read alert"
        );
    }

    fn on_failure(&self, ctx: &ReadContext, severity: ReadSeverity, error: &BindError) {
        tracing::error!(
            ?severity,
            format = ?ctx.format,
            path = %ctx.path.display(),
            sheet = %ctx.selector,
            %error,
            "read failed"
        );
    }
}

/// Appends one line per read event to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, event: &str, ctx: &ReadContext, detail: fmt::Arguments<'_>) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(
                f,
                "{} {event} format={:?} path={} sheet={} {detail}",
                unix_ts(),
                ctx.format,
                ctx.path.display(),
                ctx.selector,
            );
        }
    }
}

impl ReadObserver for FileObserver {
    fn on_success(&self, ctx: &ReadContext, stats: ReadStats) {
        self.append(
            "ok",
            ctx,
            format_args!("records={} errors={}", stats.records, stats.errors),
        );
    }

    fn on_success_alert(&self, ctx: &ReadContext, severity: ReadSeverity, stats: ReadStats) {
        self.append(
            "ALERT",
            ctx,
            format_args!(
                "severity={severity:?} records={} errors={}",
                stats.records, stats.errors
            ),
        );
    }

    fn on_failure(&self, ctx: &ReadContext, severity: ReadSeverity, error: &BindError) {
        self.append("fail", ctx, format_args!("severity={severity:?} err={error}"));
    }

    fn on_alert(&self, ctx: &ReadContext, severity: ReadSeverity, error: &BindError) {
        self.append("ALERT", ctx, format_args!("severity={severity:?} err={error}"));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
