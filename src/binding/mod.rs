//! The binding engine: field declarations, header resolution, cell coercion and row binding.
//!
//! These pieces work on plain cell text and know nothing about files. The
//! [`crate::ingestion`] layer feeds them rows read from workbooks and CSV files.
//!
//! ```
//! use sheet_binder::binding::{bind_row, resolve_header, CoercionOptions, FieldMap};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     id: i64,
//!     name: String,
//! }
//!
//! let map = FieldMap::builder()
//!     .field("id", "id", |p: &mut Person, v| p.id = v)
//!     .field("name", "name", |p: &mut Person, v| p.name = v)
//!     .build()
//!     .unwrap();
//!
//! let header = vec!["name".to_string(), "id".to_string()];
//! let layout = resolve_header(&header, 1, &map).unwrap();
//!
//! let row = vec!["Ada".to_string(), "x".to_string()];
//! let bound = bind_row(&row, 2, &map, &layout, &CoercionOptions::default());
//! assert_eq!(bound.record, Person { id: 0, name: "Ada".to_string() });
//! assert_eq!(bound.errors, vec!["cannot convert x to integer @ B2"]);
//! ```

pub mod coerce;
pub mod descriptor;
pub mod header;
pub mod row;

pub use coerce::{coerce, datetime_to_serial, serial_to_datetime, CoercionError, CoercionOptions};
pub use descriptor::{parse_alias_tag, CellValue, FieldBinding, FieldMap, FieldMapBuilder, SheetRecord};
pub use header::{cell_name, column_name, resolve_header, HeaderLayout, ResolvedColumn};
pub use row::{bind_row, BoundRow};
