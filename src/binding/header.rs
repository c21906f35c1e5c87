//! Header row resolution.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{BindError, BindResult};

use super::descriptor::FieldMap;

/// A field resolved to a column of the current sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Index of the field in its [`FieldMap`].
    pub field: usize,
    /// Zero-based column index.
    pub column: usize,
    /// Header text of the claimed column, as it appears in the sheet.
    pub header: String,
}

/// Column assignment of every field of a [`FieldMap`] for one sheet.
///
/// Layouts are sheet-specific; the same map resolves to different layouts on sheets with
/// different column orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    header_row: usize,
    columns: Vec<ResolvedColumn>,
}

impl HeaderLayout {
    /// 1-based row number of the header row.
    pub fn header_row(&self) -> usize {
        self.header_row
    }

    /// Resolved columns in field declaration order.
    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    /// Column resolved for the field at `field` in the map.
    pub fn column_of(&self, field: usize) -> Option<usize> {
        self.columns.iter().find(|c| c.field == field).map(|c| c.column)
    }
}

/// Resolve every field of `map` against a header row.
///
/// - Two header cells with byte-identical text fail with [`BindError::DuplicateHeader`].
///   Empty cells are ignored.
/// - Fields are resolved in declaration order. Each field takes the first of its aliases
///   (in alias order) that equals the trimmed text of a column no earlier field claimed.
/// - A field with no matching column fails with [`BindError::MissingField`].
///
/// Errors from this function carry an empty sheet name; callers that know the sheet attach
/// it.
pub fn resolve_header<T>(
    header: &[String],
    header_row: usize,
    map: &FieldMap<T>,
) -> BindResult<HeaderLayout> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(header.len());
    for (idx, cell) in header.iter().enumerate() {
        if cell.trim().is_empty() {
            continue;
        }
        if let Some(&first) = seen.get(cell.as_str()) {
            return Err(BindError::DuplicateHeader {
                sheet: String::new(),
                header: cell.clone(),
                first: column_name(first),
                second: column_name(idx),
            });
        }
        seen.insert(cell.as_str(), idx);
    }

    let mut claimed = vec![false; header.len()];
    let mut columns = Vec::with_capacity(map.len());

    for (field_idx, binding) in map.iter().enumerate() {
        let column = binding.aliases().iter().find_map(|alias| {
            (0..header.len()).find(|&idx| !claimed[idx] && header[idx].trim() == alias.as_str())
        });

        let Some(column) = column else {
            return Err(BindError::MissingField {
                sheet: String::new(),
                field: binding.name().to_string(),
                aliases: binding.aliases().to_vec(),
                headers: header
                    .iter()
                    .filter(|h| !h.trim().is_empty())
                    .cloned()
                    .collect(),
            });
        };

        claimed[column] = true;
        debug!(
            field = binding.name(),
            column = %column_name(column),
            header = %header[column],
            "resolved field"
        );
        columns.push(ResolvedColumn {
            field: field_idx,
            column,
            header: header[column].clone(),
        });
    }

    Ok(HeaderLayout {
        header_row,
        columns,
    })
}

/// Spreadsheet column letters for a zero-based column index (`0` → `A`, `26` → `AA`).
pub fn column_name(column: usize) -> String {
    let mut n = column + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Cell coordinate such as `B7` for a zero-based column and a 1-based row.
pub fn cell_name(column: usize, row: usize) -> String {
    format!("{}{row}", column_name(column))
}
