//! Read entrypoints and sources.
//!
//! Most callers should use [`read`] (from [`unified`]) which:
//!
//! - auto-detects the source format by file extension (or you can override via [`ReadOptions`])
//! - resolves the sheet selector, reads the sheet and binds its rows
//! - optionally reports success/failure/alerts to a [`ReadObserver`]
//!
//! Source-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature `excel`), including [`excel::WorkbookReader`] for reading several
//!   sheets of one workbook
//! - [`sheet`] for the source-independent row loop

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod sheet;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, ReadContext, ReadObserver, ReadSeverity, ReadStats, StdErrObserver,
    TracingObserver,
};
pub use sheet::{read_rows, SheetMachine, SheetRead, SheetSelector};
pub use unified::{read, read_all_sheets, read_with_map, ReadOptions, ReadRequest, SourceFormat};
