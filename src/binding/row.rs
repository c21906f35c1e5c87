//! Binding one data row into a record.

use super::coerce::{coerce, CoercionOptions};
use super::descriptor::FieldMap;
use super::header::{cell_name, HeaderLayout};

/// A record built from one row, plus the conversion failures seen while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRow<T> {
    /// The record. Fields whose cell failed to convert keep their default value.
    pub record: T,
    /// Messages of the form `"<reason> @ <cell>"`, e.g. `"cannot convert x to integer @ A3"`.
    pub errors: Vec<String>,
}

/// Build a record from `row` using a resolved layout.
///
/// Every field is attempted, even after an earlier field of the same row failed. Cells
/// beyond the end of a short row leave their field at its default value without an error.
/// `row_number` is the 1-based row used in cell coordinates.
pub fn bind_row<T: Default>(
    row: &[String],
    row_number: usize,
    map: &FieldMap<T>,
    layout: &HeaderLayout,
    options: &CoercionOptions,
) -> BoundRow<T> {
    let mut record = T::default();
    let mut errors = Vec::new();

    for resolved in layout.columns() {
        let Some(binding) = map.get(resolved.field) else {
            continue;
        };
        let Some(raw) = row.get(resolved.column) else {
            continue;
        };

        match coerce(raw, binding.field_type(), options) {
            Ok(value) => binding.set(&mut record, value),
            Err(e) => errors.push(format!("{e} @ {}", cell_name(resolved.column, row_number))),
        }
    }

    BoundRow { record, errors }
}
