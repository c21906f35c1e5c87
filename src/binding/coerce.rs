//! Cell text to typed value conversion.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use crate::error::BindResult;
use crate::types::{DataType, FieldType, Value};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Last year a spreadsheet date can carry, in either date system.
const MAX_YEAR: i32 = 9999;

/// Options that affect how cell text is converted.
///
/// Passed by value into every read, so concurrent reads with different options do not
/// interfere. Deserializes from a partial object, e.g. `{"trim": false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoercionOptions {
    /// Strip leading/trailing whitespace from string fields. Numeric, boolean and timestamp
    /// fields are always trimmed.
    pub trim: bool,
    /// Interpret timestamp serials in the 1904 date system instead of the 1900 one.
    ///
    /// Applies to plain numbers and CSV text. Date-formatted workbook cells carry their own
    /// date system and are re-encoded in this one before conversion.
    pub date_1904: bool,
}

impl CoercionOptions {
    /// Load options from a JSON object. Missing keys take their default.
    pub fn from_json(text: &str) -> BindResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Default for CoercionOptions {
    fn default() -> Self {
        Self {
            trim: true,
            date_1904: false,
        }
    }
}

/// A cell whose text cannot be converted to its field's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {raw} to {target}")]
pub struct CoercionError {
    /// Cell text as read.
    pub raw: String,
    /// Requested type.
    pub target: DataType,
}

impl CoercionError {
    fn new(raw: &str, target: DataType) -> Self {
        Self {
            raw: raw.to_string(),
            target,
        }
    }
}

/// Convert cell text into a [`Value`] of `field_type`.
///
/// - Optional fields map an empty cell to [`Value::Null`] and never fail on it.
/// - Strings never fail.
/// - Booleans never fail: only `FALSE` and `0` (case-insensitive, trimmed) are `false`.
/// - Integers accept an optional sign and `0x`/`0o`/`0b` base prefixes.
/// - Timestamps are spreadsheet serial day counts (fraction = time of day).
pub fn coerce(
    raw: &str,
    field_type: FieldType,
    options: &CoercionOptions,
) -> Result<Value, CoercionError> {
    let trimmed = raw.trim();

    if field_type.optional {
        let empty = match field_type.data_type {
            DataType::Utf8 if !options.trim => raw.is_empty(),
            _ => trimmed.is_empty(),
        };
        if empty {
            return Ok(Value::Null);
        }
    }

    match field_type.data_type {
        DataType::Utf8 => {
            let text = if options.trim { trimmed } else { raw };
            Ok(Value::Utf8(text.to_string()))
        }
        DataType::Int64 => parse_i64(trimmed)
            .map(Value::Int64)
            .ok_or_else(|| CoercionError::new(raw, DataType::Int64)),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|_| CoercionError::new(raw, DataType::Float64)),
        DataType::Bool => Ok(Value::Bool(parse_bool(trimmed))),
        DataType::Timestamp => trimmed
            .parse::<f64>()
            .ok()
            .and_then(|serial| serial_to_datetime(serial, options.date_1904))
            .map(Value::Timestamp)
            .ok_or_else(|| CoercionError::new(raw, DataType::Timestamp)),
    }
}

/// Parse a signed integer literal, honoring `0x`, `0o` and `0b` prefixes.
///
/// Leading zeros without a prefix are decimal (`"007"` is 7).
pub(crate) fn parse_i64(text: &str) -> Option<i64> {
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        Some("0o" | "0O") => (8, &rest[2..]),
        Some("0b" | "0B") => (2, &rest[2..]),
        _ => (10, rest),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }

    let magnitude = u64::from_str_radix(digits, radix).ok()?;
    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}

fn parse_bool(text: &str) -> bool {
    let upper = text.to_uppercase();
    !(upper == "FALSE" || upper == "0")
}

fn epoch(date_1904: bool) -> Option<NaiveDateTime> {
    let date = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    date?.and_hms_opt(0, 0, 0)
}

/// Convert a spreadsheet serial day count into a date and time.
///
/// In the 1900 system serials below 60 are shifted by one day, because the format counts
/// a 29 February 1900 that never existed. Returns `None` for negative or non-finite
/// serials and for dates past 9999-12-31. Time of day is rounded to the millisecond.
pub fn serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let mut days = serial.trunc() as i64;
    if !date_1904 && days < 60 {
        days += 1;
    }
    let millis = (serial.fract() * MILLIS_PER_DAY).round() as i64;

    epoch(date_1904)?
        .checked_add_signed(Duration::try_days(days)?)?
        .checked_add_signed(Duration::try_milliseconds(millis)?)
        .filter(|dt| dt.year() <= MAX_YEAR)
}

/// Inverse of [`serial_to_datetime`].
///
/// Returns `None` for dates the serial cannot represent: before the first serial day of
/// the date system, or past 9999-12-31.
pub fn datetime_to_serial(value: NaiveDateTime, date_1904: bool) -> Option<f64> {
    if value.year() > MAX_YEAR {
        return None;
    }
    let elapsed = value.signed_duration_since(epoch(date_1904)?);
    if elapsed < Duration::zero() {
        return None;
    }
    let mut days = elapsed.num_days();
    if !date_1904 && days <= 60 {
        // 1899-12-30 sits one day before serial 0.
        days = days.checked_sub(1).filter(|d| *d >= 0)?;
    }
    let millis = (elapsed - Duration::try_days(elapsed.num_days())?).num_milliseconds();
    Some(days as f64 + millis as f64 / MILLIS_PER_DAY)
}
