//! Sheet selection and the per-sheet read loop shared by all sources.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace, warn};

use crate::binding::coerce::{parse_i64, CoercionOptions};
use crate::binding::{bind_row, resolve_header, FieldMap, HeaderLayout};
use crate::error::{BindError, BindResult};
use crate::types::{is_blank, RawRow};

/// Which sheet of a source to read.
///
/// Parsed from selector text: `[]` is the first sheet, `[n]` the sheet at zero-based
/// position `n`, anything else a literal sheet name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// First sheet in source order.
    First,
    /// Sheet at a zero-based position.
    Index(usize),
    /// Sheet with this exact name.
    Name(String),
}

impl SheetSelector {
    /// Parse selector text.
    ///
    /// Fails with [`BindError::InvalidSheetIndex`] when the text between brackets is not a
    /// non-negative integer.
    pub fn parse(selector: &str) -> BindResult<Self> {
        let Some(inner) = selector
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
        else {
            return Ok(Self::Name(selector.to_string()));
        };

        let inner = inner.trim();
        if inner.is_empty() {
            return Ok(Self::First);
        }
        parse_i64(inner)
            .and_then(|n| usize::try_from(n).ok())
            .map(Self::Index)
            .ok_or_else(|| BindError::InvalidSheetIndex {
                selector: selector.to_string(),
            })
    }

    /// Resolve against the source's sheet names, in source order.
    pub fn resolve(&self, sheets: &[String]) -> BindResult<String> {
        let resolved = match self {
            Self::First => sheets.first().cloned(),
            Self::Index(index) => {
                let found = sheets.get(*index).cloned();
                if found.is_none() {
                    return Err(BindError::SheetIndexOutOfRange {
                        index: *index,
                        count: sheets.len(),
                    });
                }
                found
            }
            Self::Name(name) => sheets.iter().find(|s| *s == name).cloned(),
        };

        resolved.ok_or_else(|| BindError::SheetNotFound {
            sheet: self.to_string(),
            available: sheets.to_vec(),
        })
    }
}

impl FromStr for SheetSelector {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("[]"),
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Records and recoverable errors read from one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRead<T> {
    /// Sheet name.
    pub sheet: String,
    /// One record per non-blank data row.
    pub records: Vec<T>,
    /// Conversion failures, in row order.
    pub errors: Vec<String>,
}

enum ReadState {
    AwaitingHeader,
    ReadingData { layout: HeaderLayout, data_rows: usize },
}

/// Row-by-row reader for one sheet.
///
/// Feed every physical row in order, blank ones included, then call [`SheetMachine::finish`].
/// The first non-blank row is the header; a failure to resolve it aborts the sheet.
/// Data rows are numbered from the header row, counting only non-blank rows.
pub struct SheetMachine<'a, T> {
    sheet: &'a str,
    map: &'a FieldMap<T>,
    options: CoercionOptions,
    state: ReadState,
    physical_row: usize,
    records: Vec<T>,
    errors: Vec<String>,
}

impl<'a, T: Default> SheetMachine<'a, T> {
    /// Start reading `sheet`.
    pub fn new(sheet: &'a str, map: &'a FieldMap<T>, options: CoercionOptions) -> Self {
        Self {
            sheet,
            map,
            options,
            state: ReadState::AwaitingHeader,
            physical_row: 0,
            records: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Process the next physical row.
    pub fn feed(&mut self, row: RawRow) -> BindResult<()> {
        self.physical_row += 1;
        if is_blank(&row) {
            trace!(sheet = self.sheet, row = self.physical_row, "skipping blank row");
            return Ok(());
        }

        if let ReadState::ReadingData { layout, data_rows } = &mut self.state {
            *data_rows += 1;
            let row_number = layout.header_row() + *data_rows;
            let bound = bind_row(&row, row_number, self.map, layout, &self.options);
            self.records.push(bound.record);
            self.errors.extend(bound.errors);
            return Ok(());
        }

        let layout = resolve_header(&row, self.physical_row, self.map)
            .map_err(|e| e.in_sheet(self.sheet))?;
        debug!(
            sheet = self.sheet,
            header_row = layout.header_row(),
            fields = layout.columns().len(),
            "header resolved"
        );
        self.state = ReadState::ReadingData {
            layout,
            data_rows: 0,
        };
        Ok(())
    }

    /// End of input. Fails with [`BindError::EmptySheet`] if no header was seen.
    pub fn finish(self) -> BindResult<SheetRead<T>> {
        if matches!(self.state, ReadState::AwaitingHeader) {
            return Err(BindError::EmptySheet {
                sheet: self.sheet.to_string(),
            });
        }

        if !self.errors.is_empty() {
            warn!(
                sheet = self.sheet,
                errors = self.errors.len(),
                "some cells could not be converted"
            );
        }
        debug!(sheet = self.sheet, records = self.records.len(), "sheet read");

        Ok(SheetRead {
            sheet: self.sheet.to_string(),
            records: self.records,
            errors: self.errors,
        })
    }
}

/// Read a whole sheet from an iterator of physical rows.
pub fn read_rows<T, I>(
    sheet: &str,
    rows: I,
    map: &FieldMap<T>,
    options: CoercionOptions,
) -> BindResult<SheetRead<T>>
where
    T: Default,
    I: IntoIterator<Item = RawRow>,
{
    let mut machine = SheetMachine::new(sheet, map, options);
    for row in rows {
        machine.feed(row)?;
    }
    machine.finish()
}

/// Drop trailing empty cells so that an all-empty row becomes blank.
pub(crate) fn trim_trailing_empty(row: &mut RawRow) {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        id: i64,
        name: String,
    }

    fn person_map() -> FieldMap<Person> {
        FieldMap::builder()
            .field("id", "id", |p: &mut Person, v| p.id = v)
            .field("name", "name", |p: &mut Person, v| p.name = v)
            .build()
            .unwrap()
    }

    fn rows(data: &[&[&str]]) -> Vec<RawRow> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn sheets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn selector_parsing() {
        assert_eq!(SheetSelector::parse("[]").unwrap(), SheetSelector::First);
        assert_eq!(SheetSelector::parse("[ ]").unwrap(), SheetSelector::First);
        assert_eq!(SheetSelector::parse("[1]").unwrap(), SheetSelector::Index(1));
        assert_eq!(SheetSelector::parse("[ 2 ]").unwrap(), SheetSelector::Index(2));
        assert_eq!(SheetSelector::parse("[0x3]").unwrap(), SheetSelector::Index(3));
        assert_eq!(
            SheetSelector::parse("Sheet1").unwrap(),
            SheetSelector::Name("Sheet1".to_string())
        );
        assert_eq!(
            SheetSelector::parse("[draft").unwrap(),
            SheetSelector::Name("[draft".to_string())
        );
        assert!(matches!(
            SheetSelector::parse("[one]"),
            Err(BindError::InvalidSheetIndex { .. })
        ));
        assert!(matches!(
            SheetSelector::parse("[-1]"),
            Err(BindError::InvalidSheetIndex { .. })
        ));
    }

    #[test]
    fn selector_resolution() {
        let names = sheets(&["Sheet1", "Sheet2"]);
        let resolve = |s: &str| SheetSelector::parse(s).unwrap().resolve(&names);

        assert_eq!(resolve("[]").unwrap(), "Sheet1");
        assert_eq!(resolve("[1]").unwrap(), "Sheet2");
        assert_eq!(resolve("Sheet2").unwrap(), "Sheet2");
        assert!(matches!(
            resolve("[5]"),
            Err(BindError::SheetIndexOutOfRange { index: 5, count: 2 })
        ));
        assert!(matches!(resolve("Missing"), Err(BindError::SheetNotFound { .. })));
        assert!(matches!(
            SheetSelector::First.resolve(&[]),
            Err(BindError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn reads_records_and_errors() {
        let input = rows(&[&["id", "name"], &["1", "Alice"], &["x", "Bob"]]);
        let read = read_rows("People", input, &person_map(), CoercionOptions::default()).unwrap();

        assert_eq!(
            read.records,
            vec![
                Person {
                    id: 1,
                    name: "Alice".to_string()
                },
                Person {
                    id: 0,
                    name: "Bob".to_string()
                },
            ]
        );
        assert_eq!(read.errors, vec!["cannot convert x to integer @ A3"]);
    }

    #[test]
    fn blank_rows_are_skipped_and_not_counted() {
        let input = rows(&[
            &[],
            &["id", "name"],
            &[],
            &["1", "Alice"],
            &[],
            &[],
            &["y", "Bob"],
        ]);
        let read = read_rows("People", input, &person_map(), CoercionOptions::default()).unwrap();

        assert_eq!(read.records.len(), 2);
        // Header sits on row 2; "y" is the second data row.
        assert_eq!(read.errors, vec!["cannot convert y to integer @ A4"]);
    }

    #[test]
    fn header_failure_aborts_the_sheet() {
        let input = rows(&[&["id", "id"], &["1", "2"]]);
        let err = read_rows("Dup", input, &person_map(), CoercionOptions::default()).unwrap_err();
        assert!(err.to_string().contains("sheet 'Dup'"));
        assert!(err.to_string().contains("duplicate header name 'id'"));

        let input = rows(&[&["id"], &["1"]]);
        let err = read_rows("Narrow", input, &person_map(), CoercionOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            BindError::MissingField { ref sheet, ref field, .. } if sheet == "Narrow" && field == "name"
        ));
    }

    #[test]
    fn sheet_without_rows_is_empty() {
        let err = read_rows("Void", rows(&[&[], &[]]), &person_map(), CoercionOptions::default())
            .unwrap_err();
        assert!(matches!(err, BindError::EmptySheet { ref sheet } if sheet == "Void"));
    }

    #[test]
    fn header_only_sheet_has_no_records() {
        let read = read_rows(
            "Header",
            rows(&[&["id", "name"]]),
            &person_map(),
            CoercionOptions::default(),
        )
        .unwrap();
        assert!(read.records.is_empty());
        assert!(read.errors.is_empty());
    }

    #[test]
    fn trailing_empty_cells_are_dropped() {
        let mut row = vec!["a".to_string(), String::new(), "b".to_string(), String::new()];
        trim_trailing_empty(&mut row);
        assert_eq!(row, vec!["a", "", "b"]);

        let mut row = vec![String::new(), String::new()];
        trim_trailing_empty(&mut row);
        assert!(is_blank(&row));
    }
}
