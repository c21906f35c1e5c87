//! Core data model types for binding.
//!
//! Rows arrive as [`RawRow`]s of cell text, are coerced into typed [`Value`]s according to a
//! field's [`FieldType`], and end up in caller records collected in a [`ReadResult`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Logical data type of a bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// UTF-8 string.
    Utf8,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// Calendar date and time, read from a spreadsheet serial day count.
    Timestamp,
}

impl DataType {
    /// Lowercase name used in conversion error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "string",
            Self::Int64 => "integer",
            Self::Float64 => "float",
            Self::Bool => "boolean",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared semantic type of a field: a [`DataType`] that may be optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    /// Underlying data type.
    pub data_type: DataType,
    /// Whether an empty cell maps to "no value" instead of being parsed.
    pub optional: bool,
}

impl FieldType {
    /// A required field of `data_type`.
    pub const fn required(data_type: DataType) -> Self {
        Self {
            data_type,
            optional: false,
        }
    }

    /// An optional field of `data_type`.
    pub const fn optional(data_type: DataType) -> Self {
        Self {
            data_type,
            optional: true,
        }
    }
}

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value (empty cell bound to an optional field).
    Null,
    /// UTF-8 string.
    Utf8(String),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// Date and time.
    Timestamp(NaiveDateTime),
}

/// One row of cell text as read from a source.
///
/// Sources drop trailing empty cells, so a row with no cells is blank.
pub type RawRow = Vec<String>;

/// Returns `true` if the row carries no cells.
pub fn is_blank(row: &[String]) -> bool {
    row.is_empty()
}

/// Recoverable errors keyed by source (sheet) name, in sheet-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorLog {
    entries: BTreeMap<String, Vec<String>>,
}

impl ErrorLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append messages for `sheet`. Empty batches still register the sheet.
    pub fn extend(&mut self, sheet: &str, messages: impl IntoIterator<Item = String>) {
        self.entries
            .entry(sheet.to_string())
            .or_default()
            .extend(messages);
    }

    /// Messages recorded for `sheet`, if the sheet was read.
    pub fn get(&self, sheet: &str) -> Option<&[String]> {
        self.entries.get(sheet).map(Vec::as_slice)
    }

    /// Iterate `(sheet, messages)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total number of messages across all sheets.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// `true` if no sheet has any message.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge another log into this one.
    pub fn merge(&mut self, other: ErrorLog) {
        for (sheet, messages) in other.entries {
            self.entries.entry(sheet).or_default().extend(messages);
        }
    }

    /// Consume the log into its underlying map.
    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.entries
    }
}

/// Outcome of a successful read: bound records plus recoverable errors.
///
/// Records whose row produced errors are still present, with the failed fields left at
/// their default value. Consult [`ReadResult::errors`] to tell which rows are trustworthy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult<T> {
    /// One record per non-blank data row, in sheet order.
    pub records: Vec<T>,
    /// Conversion failures keyed by sheet name.
    pub errors: ErrorLog,
}

impl<T> ReadResult<T> {
    /// Create a result.
    pub fn new(records: Vec<T>, errors: ErrorLog) -> Self {
        Self { records, errors }
    }

    /// Number of bound records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// `true` if any cell failed to convert.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
