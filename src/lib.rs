//! `sheet-binder` reads rows of a spreadsheet sheet (or a CSV file) into instances of your own
//! record type.
//!
//! Each record field declares one or more acceptable header names (aliases). The first
//! non-empty row of the sheet is the header; every field is matched to a column by alias,
//! and each following non-empty row becomes one record.
//!
//! The primary entrypoint is [`ingestion::read`], which infers the file format from the
//! extension and selects the sheet by name or position.
//!
//! ## Field types
//!
//! Fields bind to `String`, `i64`, `f64`, `bool` and [`chrono::NaiveDateTime`], or an
//! `Option` of any of these. Timestamps are read from spreadsheet serial day numbers.
//! An empty cell in an `Option` field becomes `None`.
//!
//! ## Errors
//!
//! Reads fail with a [`BindError`] only for structural problems: the file or sheet cannot be
//! found, the sheet is empty, two header cells share a name, or a field matches no header.
//! A cell that cannot be converted does **not** fail the read: its field keeps its default
//! value and a message such as `cannot convert x to integer @ A3` is recorded under the
//! sheet name in [`types::ReadResult::errors`].
//!
//! ## Example
//!
//! ```no_run
//! use chrono::NaiveDateTime;
//! use sheet_binder::binding::{FieldMap, SheetRecord};
//! use sheet_binder::ingestion::{read, ReadOptions};
//! use sheet_binder::BindResult;
//!
//! #[derive(Debug, Default)]
//! struct City {
//!     id: i64,
//!     name: String,
//!     postcode: Option<i64>,
//!     founded: Option<NaiveDateTime>,
//! }
//!
//! impl SheetRecord for City {
//!     fn field_map() -> BindResult<FieldMap<Self>> {
//!         FieldMap::builder()
//!             .field("id", "序号,编号", |c: &mut City, v| c.id = v)
//!             .field("name", "城市,city", |c: &mut City, v| c.name = v)
//!             .field("postcode", "邮政编码", |c: &mut City, v| c.postcode = v)
//!             .field("founded", "日期", |c: &mut City, v| c.founded = v)
//!             .build()
//!     }
//! }
//!
//! # fn main() -> BindResult<()> {
//! // "[1]" selects the second sheet; "[]" the first; anything else is a sheet name.
//! let result = read::<City>("cities.xlsx", "[1]", &ReadOptions::default())?;
//! println!("rows={} bad cells={}", result.record_count(), result.errors.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`binding`]: field declarations, header resolution, cell coercion, row binding
//! - [`ingestion`]: read entrypoints, sheet selection, workbook and CSV sources
//! - [`types`]: values, error log and read results
//! - [`error`]: terminal error type

pub mod binding;
pub mod error;
pub mod ingestion;
pub mod types;

pub use error::{BindError, BindResult};
