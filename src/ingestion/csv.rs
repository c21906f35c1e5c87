//! CSV sources.
//!
//! A CSV file is a source with a single sheet named after the file stem (`people.csv` →
//! `people`). The selectors `[]`, `[0]` and the stem all resolve to it.

use std::path::Path;

use crate::binding::{CoercionOptions, FieldMap};
use crate::error::BindResult;
use crate::types::{ErrorLog, RawRow, ReadResult};

use super::sheet::{trim_trailing_empty, SheetMachine, SheetRead, SheetSelector};

/// Read a CSV file.
///
/// Rules:
///
/// - The first non-blank line is the header; earlier blank lines are skipped.
/// - Rows may have any length; missing trailing cells leave their field at its default.
/// - Blank lines and lines of only separators produce no record.
pub fn read_csv_from_path<T: Default>(
    path: impl AsRef<Path>,
    selector: &str,
    map: &FieldMap<T>,
    options: CoercionOptions,
) -> BindResult<ReadResult<T>> {
    let path = path.as_ref();
    let sheet = SheetSelector::parse(selector)?.resolve(&[sheet_name_for(path)])?;

    let mut rdr = reader_builder().from_path(path)?;
    let read = read_csv_from_reader(&sheet, &mut rdr, map, options)?;

    let mut errors = ErrorLog::new();
    errors.extend(&read.sheet, read.errors);
    Ok(ReadResult::new(read.records, errors))
}

/// Read CSV data from an existing reader under the given sheet name.
///
/// The reader should be built without headers (see [`reader_builder`]) so the header row
/// goes through the same resolution as spreadsheet headers.
pub fn read_csv_from_reader<T: Default, R: std::io::Read>(
    sheet: &str,
    rdr: &mut csv::Reader<R>,
    map: &FieldMap<T>,
    options: CoercionOptions,
) -> BindResult<SheetRead<T>> {
    let mut machine = SheetMachine::new(sheet, map, options);

    // The csv reader drops empty lines; feed them back so header coordinates match the file.
    let mut next_line: u64 = 1;
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(next_line, |p| p.line());
        while next_line < line {
            machine.feed(Vec::new())?;
            next_line += 1;
        }

        let mut row: RawRow = record.iter().map(str::to_string).collect();
        trim_trailing_empty(&mut row);
        machine.feed(row)?;
        next_line = line + 1;
    }

    machine.finish()
}

/// CSV reader settings used by [`read_csv_from_path`]: no header handling, ragged rows
/// allowed.
pub fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

/// Sheet name of a CSV file: its file stem.
pub fn sheet_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
