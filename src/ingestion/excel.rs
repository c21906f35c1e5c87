#![cfg(feature = "excel")]

//! Workbook sources (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) backed by `calamine`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::binding::{datetime_to_serial, CoercionOptions, FieldMap, SheetRecord};
use crate::error::BindResult;
use crate::types::{ErrorLog, RawRow, ReadResult};

use super::sheet::{read_rows, trim_trailing_empty, SheetRead, SheetSelector};

/// An open workbook that can read several sheets, each into its own record type.
///
/// Recoverable errors of every sheet read through the same reader accumulate in one
/// [`ErrorLog`]. The file is closed when the reader is dropped.
///
/// ```no_run
/// use sheet_binder::binding::{FieldMap, SheetRecord};
/// use sheet_binder::ingestion::excel::WorkbookReader;
/// use sheet_binder::BindResult;
///
/// #[derive(Default)]
/// struct City { name: String }
/// impl SheetRecord for City {
///     fn field_map() -> BindResult<FieldMap<Self>> {
///         FieldMap::builder().field("name", "city", |c: &mut City, v| c.name = v).build()
///     }
/// }
///
/// #[derive(Default)]
/// struct Vendor { name: String }
/// impl SheetRecord for Vendor {
///     fn field_map() -> BindResult<FieldMap<Self>> {
///         FieldMap::builder().field("name", "vendor", |v: &mut Vendor, s| v.name = s).build()
///     }
/// }
///
/// # fn main() -> BindResult<()> {
/// let mut wb = WorkbookReader::open("cities.xlsx", Default::default())?;
/// let cities: Vec<City> = wb.read("[]")?;
/// let vendors: Vec<Vendor> = wb.read("Vendors")?;
/// let errors = wb.finish();
/// println!("{} cities, {} vendors, {} bad cells", cities.len(), vendors.len(), errors.len());
/// # Ok(())
/// # }
/// ```
pub struct WorkbookReader {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
    sheets: Vec<String>,
    options: CoercionOptions,
    errors: ErrorLog,
}

impl WorkbookReader {
    /// Open a workbook. The format is detected from the extension.
    pub fn open(path: impl AsRef<Path>, options: CoercionOptions) -> BindResult<Self> {
        let path = path.as_ref();
        let workbook = open_workbook_auto(path)?;
        let sheets = workbook.sheet_names();
        debug!(path = %path.display(), sheets = ?sheets, "workbook opened");

        Ok(Self {
            path: path.to_path_buf(),
            workbook,
            sheets,
            options,
            errors: ErrorLog::new(),
        })
    }

    /// Path the workbook was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheets
    }

    /// Read one sheet into a [`SheetRecord`] type.
    pub fn read<T: SheetRecord>(&mut self, selector: &str) -> BindResult<Vec<T>> {
        let map = T::field_map()?;
        self.read_with_map(selector, &map)
    }

    /// Read one sheet with an explicit field map.
    pub fn read_with_map<T: Default>(
        &mut self,
        selector: &str,
        map: &FieldMap<T>,
    ) -> BindResult<Vec<T>> {
        let sheet = SheetSelector::parse(selector)?.resolve(&self.sheets)?;
        let read = self.read_sheet(&sheet, map)?;
        self.errors.extend(&read.sheet, read.errors);
        Ok(read.records)
    }

    /// Read every sheet into the same record type, in workbook order.
    ///
    /// All sheets must resolve against `map`; the first terminal error aborts the read.
    pub fn read_all_with_map<T: Default>(&mut self, map: &FieldMap<T>) -> BindResult<Vec<T>> {
        let mut records = Vec::new();
        for sheet in self.sheets.clone() {
            let read = self.read_sheet(&sheet, map)?;
            self.errors.extend(&read.sheet, read.errors);
            records.extend(read.records);
        }
        Ok(records)
    }

    /// Recoverable errors collected so far.
    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Close the workbook and return the collected errors.
    pub fn finish(self) -> ErrorLog {
        self.errors
    }

    fn read_sheet<T: Default>(&mut self, sheet: &str, map: &FieldMap<T>) -> BindResult<SheetRead<T>> {
        let range = self.workbook.worksheet_range(sheet)?;
        debug!(sheet, start = ?range.start(), end = ?range.end(), "reading sheet");
        read_rows(
            sheet,
            range_rows(&range, self.options.date_1904),
            map,
            self.options,
        )
    }
}

/// Read one sheet of a workbook.
pub fn read_excel_from_path<T: Default>(
    path: impl AsRef<Path>,
    selector: &str,
    map: &FieldMap<T>,
    options: CoercionOptions,
) -> BindResult<ReadResult<T>> {
    let mut workbook = WorkbookReader::open(path, options)?;
    let records = workbook.read_with_map(selector, map)?;
    Ok(ReadResult::new(records, workbook.finish()))
}

/// Read every sheet of a workbook into one record type and concatenate the records.
pub fn read_excel_all_sheets<T: Default>(
    path: impl AsRef<Path>,
    map: &FieldMap<T>,
    options: CoercionOptions,
) -> BindResult<ReadResult<T>> {
    let mut workbook = WorkbookReader::open(path, options)?;
    let records = workbook.read_all_with_map(map)?;
    Ok(ReadResult::new(records, workbook.finish()))
}

/// Physical rows of a sheet, starting at row 1 and column A.
///
/// `calamine` ranges begin at the first used cell, so leading rows are emitted blank and
/// leading columns padded with empty cells to keep coordinates sheet-absolute.
fn range_rows(range: &Range<Data>, date_1904: bool) -> impl Iterator<Item = RawRow> + '_ {
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    std::iter::repeat_with(Vec::new)
        .take(start_row)
        .chain(range.rows().map(move |cells| {
            let mut row: RawRow = Vec::with_capacity(start_col + cells.len());
            row.resize(start_col, String::new());
            row.extend(cells.iter().map(|c| cell_to_raw(c, date_1904)));
            trim_trailing_empty(&mut row);
            row
        }))
}

/// Cell text as a sheet reader shows it.
///
/// Date cells become a serial number in the reader's date system (`date_1904`), whatever
/// system the workbook itself uses, so timestamp fields convert them regardless of
/// display format. Dates that cannot be re-encoded keep their stored value.
fn cell_to_raw(c: &Data, date_1904: bool) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => excel_datetime_serial(dt, date_1904)
            .unwrap_or_else(|| dt.as_f64())
            .to_string(),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .and_then(|v| datetime_to_serial(v, date_1904))
            .map_or_else(|| s.clone(), |serial| serial.to_string()),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}

fn excel_datetime_serial(dt: &ExcelDateTime, date_1904: bool) -> Option<f64> {
    if dt.is_duration() {
        return None;
    }
    let (year, month, day, hour, min, sec, milli) = dt.to_ymd_hms_milli();
    let value = NaiveDate::from_ymd_opt(year.into(), month.into(), day.into())?
        .and_hms_milli_opt(hour.into(), min.into(), sec.into(), milli.into())?;
    datetime_to_serial(value, date_1904)
}

/// OpenDocument date values: `2023-03-15` or `2023-03-15T18:00:00[.fff]`.
fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use calamine::ExcelDateTimeType;

    use super::*;
    use crate::binding::coerce;
    use crate::types::{DataType, FieldType, Value};

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn bind_timestamp(c: &Data, options: CoercionOptions) -> Option<NaiveDateTime> {
        let raw = cell_to_raw(c, options.date_1904);
        match coerce(&raw, FieldType::required(DataType::Timestamp), &options) {
            Ok(Value::Timestamp(v)) => Some(v),
            _ => None,
        }
    }

    #[test]
    fn cells_render_like_a_sheet() {
        assert_eq!(cell_to_raw(&Data::String(" Ada ".to_string()), false), " Ada ");
        assert_eq!(cell_to_raw(&Data::Int(-4), false), "-4");
        assert_eq!(cell_to_raw(&Data::Float(1.0), false), "1");
        assert_eq!(cell_to_raw(&Data::Float(98.25), false), "98.25");
        assert_eq!(cell_to_raw(&Data::Bool(true), false), "TRUE");
        assert_eq!(cell_to_raw(&Data::Bool(false), false), "FALSE");
        assert_eq!(cell_to_raw(&Data::Empty, false), "");
    }

    #[test]
    fn opendocument_dates_bind_to_timestamps() {
        let opts = CoercionOptions::default();
        let at = Data::DateTimeIso("2023-03-15T18:00:00".to_string());
        assert_eq!(cell_to_raw(&at, false), "45000.75");
        assert_eq!(bind_timestamp(&at, opts), Some(ts(2023, 3, 15, 18, 0)));

        let day = Data::DateTimeIso("2023-03-15".to_string());
        assert_eq!(bind_timestamp(&day, opts), Some(ts(2023, 3, 15, 0, 0)));

        let fraction = Data::DateTimeIso("2023-03-15T18:00:00.500".to_string());
        assert_eq!(
            bind_timestamp(&fraction, opts),
            NaiveDate::from_ymd_opt(2023, 3, 15)
                .unwrap()
                .and_hms_milli_opt(18, 0, 0, 500)
        );

        let date_1904 = CoercionOptions {
            date_1904: true,
            ..opts
        };
        assert_eq!(bind_timestamp(&at, date_1904), Some(ts(2023, 3, 15, 18, 0)));

        let odd = Data::DateTimeIso("next week".to_string());
        assert_eq!(cell_to_raw(&odd, false), "next week");
        assert_eq!(bind_timestamp(&odd, opts), None);
    }

    #[test]
    fn workbook_date_system_is_honored() {
        let opts = CoercionOptions::default();
        let from_1904 = Data::DateTime(ExcelDateTime::new(43538.75, ExcelDateTimeType::DateTime, true));
        assert_eq!(cell_to_raw(&from_1904, false), "45000.75");
        assert_eq!(bind_timestamp(&from_1904, opts), Some(ts(2023, 3, 15, 18, 0)));

        let from_1900 = Data::DateTime(ExcelDateTime::new(45000.75, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_to_raw(&from_1900, false), "45000.75");
        let read_as_1904 = CoercionOptions {
            date_1904: true,
            ..opts
        };
        assert_eq!(cell_to_raw(&from_1900, true), "43538.75");
        assert_eq!(bind_timestamp(&from_1900, read_as_1904), Some(ts(2023, 3, 15, 18, 0)));

        let duration = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_to_raw(&duration, false), "1.5");
    }

    #[test]
    fn ranges_are_padded_to_sheet_origin() {
        let mut range = Range::new((1, 1), (2, 2));
        range.set_value((1, 1), Data::String("id".to_string()));
        range.set_value((1, 2), Data::String("name".to_string()));
        range.set_value((2, 1), Data::Float(7.0));

        let rows: Vec<RawRow> = range_rows(&range, false).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_empty());
        assert_eq!(rows[1], vec!["", "id", "name"]);
        assert_eq!(rows[2], vec!["", "7"]);
    }
}
