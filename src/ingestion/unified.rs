//! Unified read entrypoint.
//!
//! Most callers should use [`read`], which binds one sheet of a file to a [`SheetRecord`]
//! type.
//!
//! - If [`ReadOptions::format`] is `None`, the source format is inferred from the file
//!   extension.
//! - If a [`super::observability::ReadObserver`] is provided, success/failure/alerts are
//!   reported to it.

#[cfg(feature = "excel")]
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::binding::{CoercionOptions, FieldMap, SheetRecord};
use crate::error::{BindError, BindResult};
use crate::types::ReadResult;

use super::csv;
use super::observability::{ReadContext, ReadObserver, ReadSeverity, ReadStats};

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated values, read as a single sheet.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "xla" | "xlam" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Options controlling a read.
///
/// Use [`Default`] for common cases: format inferred from the extension, strings trimmed,
/// 1900 date system, no observer.
#[derive(Clone)]
pub struct ReadOptions {
    /// If `None`, infer the format from the file extension.
    pub format: Option<SourceFormat>,
    /// Cell conversion options.
    pub coercion: CoercionOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn ReadObserver>>,
    /// Severity threshold at which `on_alert` (failures) or `on_success_alert` (reads with
    /// [`ReadSeverity::Info`] or [`ReadSeverity::Warning`]) is invoked.
    pub alert_at_or_above: ReadSeverity,
}

impl ReadOptions {
    /// Default options with string trimming switched on or off.
    pub fn with_trim(trim: bool) -> Self {
        Self {
            coercion: CoercionOptions {
                trim,
                ..CoercionOptions::default()
            },
            ..Self::default()
        }
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("format", &self.format)
            .field("coercion", &self.coercion)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            format: None,
            coercion: CoercionOptions::default(),
            observer: None,
            alert_at_or_above: ReadSeverity::Critical,
        }
    }
}

/// Read one sheet of a file into records of type `T`.
///
/// Fails only on structural problems: unreadable file, unknown sheet, bad selector, empty
/// sheet, duplicate header names, or a field missing from the header. Cells that cannot be
/// converted are reported in [`ReadResult::errors`], keyed by sheet name, and their
/// fields keep their default value.
///
/// # Examples
///
/// ```no_run
/// use sheet_binder::binding::{FieldMap, SheetRecord};
/// use sheet_binder::ingestion::{read, ReadOptions};
/// use sheet_binder::BindResult;
///
/// #[derive(Debug, Default)]
/// struct Person {
///     id: i64,
///     name: String,
/// }
///
/// impl SheetRecord for Person {
///     fn field_map() -> BindResult<FieldMap<Self>> {
///         FieldMap::builder()
///             .field("id", "id,ID", |p: &mut Person, v| p.id = v)
///             .field("name", "name", |p: &mut Person, v| p.name = v)
///             .build()
///     }
/// }
///
/// # fn main() -> BindResult<()> {
/// let result = read::<Person>("people.xlsx", "[]", &ReadOptions::default())?;
/// for (sheet, messages) in result.errors.iter() {
///     for m in messages {
///         eprintln!("{sheet}: {m}");
///     }
/// }
/// println!("records={}", result.record_count());
/// # Ok(())
/// # }
/// ```
///
/// ## Observability (stderr logging + alert threshold)
///
/// ```no_run
/// use std::sync::Arc;
///
/// use sheet_binder::binding::FieldMap;
/// use sheet_binder::ingestion::{read_with_map, ReadOptions, ReadSeverity, StdErrObserver};
///
/// #[derive(Debug, Default)]
/// struct Row { id: i64 }
///
/// let map = FieldMap::builder().field("id", "id", |r: &mut Row, v| r.id = v).build().unwrap();
/// let opts = ReadOptions {
///     observer: Some(Arc::new(StdErrObserver::default())),
///     alert_at_or_above: ReadSeverity::Critical,
///     ..Default::default()
/// };
///
/// // Missing files are treated as Critical and will trigger `on_alert` at this threshold.
/// let _err = read_with_map("does_not_exist.csv", "[]", &map, &opts).unwrap_err();
/// ```
pub fn read<T: SheetRecord>(
    path: impl AsRef<Path>,
    selector: &str,
    options: &ReadOptions,
) -> BindResult<ReadResult<T>> {
    let map = T::field_map()?;
    read_with_map(path, selector, &map, options)
}

/// Like [`read`], with an explicit field map.
///
/// Useful when one map is reused for many files.
pub fn read_with_map<T: Default>(
    path: impl AsRef<Path>,
    selector: &str,
    map: &FieldMap<T>,
    options: &ReadOptions,
) -> BindResult<ReadResult<T>> {
    let path = path.as_ref();
    observed(path, selector, options, |fmt| match fmt {
        SourceFormat::Csv => csv::read_csv_from_path(path, selector, map, options.coercion),
        SourceFormat::Excel => read_excel_dispatch(path, Some(selector), map, options.coercion),
    })
}

/// Read every sheet of a file into one record type and concatenate the records.
///
/// Every sheet must carry the fields of `T`. For CSV this is the same as reading `[]`.
pub fn read_all_sheets<T: SheetRecord>(
    path: impl AsRef<Path>,
    options: &ReadOptions,
) -> BindResult<ReadResult<T>> {
    let path = path.as_ref();
    let map = T::field_map()?;
    observed(path, "*", options, |fmt| match fmt {
        SourceFormat::Csv => csv::read_csv_from_path(path, "[]", &map, options.coercion),
        SourceFormat::Excel => read_excel_dispatch(path, None, &map, options.coercion),
    })
}

fn observed<T>(
    path: &Path,
    selector: &str,
    options: &ReadOptions,
    run: impl FnOnce(SourceFormat) -> BindResult<ReadResult<T>>,
) -> BindResult<ReadResult<T>> {
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = ReadContext {
        path: path.to_path_buf(),
        format: fmt,
        selector: selector.to_string(),
    };

    let result = run(fmt);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(r) => {
                let stats = ReadStats {
                    records: r.record_count(),
                    errors: r.errors.len(),
                };
                obs.on_success(&ctx, stats);
                let sev = stats.severity();
                if sev >= options.alert_at_or_above {
                    obs.on_success_alert(&ctx, sev, stats);
                }
            }
            Err(e) => {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn severity_for_error(e: &BindError) -> ReadSeverity {
    match e {
        BindError::Io(_) => ReadSeverity::Critical,
        BindError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => ReadSeverity::Critical,
            _ => ReadSeverity::Error,
        },
        #[cfg(feature = "excel")]
        BindError::Excel(err) => {
            // calamine wraps file-open failures inside format-specific errors.
            if error_chain_contains_io(err) {
                ReadSeverity::Critical
            } else {
                ReadSeverity::Error
            }
        }
        _ => ReadSeverity::Error,
    }
}

#[cfg(feature = "excel")]
fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

fn infer_format_from_path(path: &Path) -> BindResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| BindError::UnsupportedFormat {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| BindError::UnsupportedFormat {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn read_excel_dispatch<T: Default>(
    path: &Path,
    selector: Option<&str>,
    map: &FieldMap<T>,
    options: CoercionOptions,
) -> BindResult<ReadResult<T>> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, selector, map, options);

    #[cfg(feature = "excel")]
    {
        use super::excel;

        match selector {
            Some(selector) => excel::read_excel_from_path(path, selector, map, options),
            None => excel::read_excel_all_sheets(path, map, options),
        }
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(BindError::UnsupportedFormat {
            message: "excel support not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

/// Owned read request: a path, a sheet selector and options.
///
/// This can be useful to queue reads or to build them from configuration.
#[derive(Clone)]
pub struct ReadRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Sheet selector (`"Sheet1"`, `"[2]"`, `"[]"`).
    pub selector: String,
    /// Options controlling the read.
    pub options: ReadOptions,
}

impl fmt::Debug for ReadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadRequest")
            .field("path", &self.path)
            .field("selector", &self.selector)
            .field("options", &self.options)
            .finish()
    }
}

impl ReadRequest {
    /// Create a request with default options.
    pub fn new(path: impl Into<PathBuf>, selector: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            selector: selector.into(),
            options: ReadOptions::default(),
        }
    }

    /// Execute the request by calling [`read`].
    pub fn run<T: SheetRecord>(&self) -> BindResult<ReadResult<T>> {
        read(&self.path, &self.selector, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_from_extension() {
        assert_eq!(SourceFormat::from_extension("CSV"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_extension("xlsx"), Some(SourceFormat::Excel));
        assert_eq!(SourceFormat::from_extension("ods"), Some(SourceFormat::Excel));
        assert_eq!(SourceFormat::from_extension("json"), None);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = infer_format_from_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, BindError::UnsupportedFormat { .. }));
        let err = infer_format_from_path(Path::new("noext")).unwrap_err();
        assert!(err.to_string().contains("no extension"));
    }

    #[test]
    fn io_errors_are_critical() {
        let io = BindError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(severity_for_error(&io), ReadSeverity::Critical);
        let structural = BindError::EmptySheet {
            sheet: "S".to_string(),
        };
        assert_eq!(severity_for_error(&structural), ReadSeverity::Error);
    }
}
