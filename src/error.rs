use thiserror::Error;

/// Convenience result type for read and binding operations.
pub type BindResult<T> = Result<T, BindError>;

/// Terminal error returned by read functions.
///
/// Any of these aborts the affected sheet. Per-cell conversion problems are never reported
/// here; they go to the [`crate::types::ErrorLog`] of a successful read.
#[derive(Debug, Error)]
pub enum BindError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Workbook could not be opened or a sheet could not be read.
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV reader error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Options could not be parsed.
    #[error("invalid options: {0}")]
    Config(#[from] serde_json::Error),

    /// The file format could not be inferred or is not enabled in this build.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// A literal sheet name does not exist in the source.
    #[error("sheet '{sheet}' not found. sheets={available:?}")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    /// A `[n]` selector points past the last sheet.
    #[error("sheet index {index} is out of range (source has {count} sheets)")]
    SheetIndexOutOfRange { index: usize, count: usize },

    /// The text inside a `[...]` selector is not a sheet index.
    #[error("sheet selector '{selector}' is not a valid index")]
    InvalidSheetIndex { selector: String },

    /// The sheet has no non-blank row, so there is no header to resolve.
    #[error("sheet '{sheet}' has no non-empty rows (no header row found)")]
    EmptySheet { sheet: String },

    /// Two header cells carry the same text.
    #[error("sheet '{sheet}': duplicate header name '{header}' in columns {first} and {second}")]
    DuplicateHeader {
        sheet: String,
        header: String,
        first: String,
        second: String,
    },

    /// None of a field's aliases appears in the header row.
    #[error("sheet '{sheet}': required field '{field}' not found in header. aliases={aliases:?} headers={headers:?}")]
    MissingField {
        sheet: String,
        field: String,
        aliases: Vec<String>,
        headers: Vec<String>,
    },

    /// A record type declared a field that cannot take part in binding.
    #[error("invalid declaration for field '{field}': {message}")]
    InvalidFieldDeclaration { field: String, message: String },
}

impl BindError {
    /// Attach the sheet name to header errors raised before the sheet was known.
    pub(crate) fn in_sheet(self, name: &str) -> Self {
        match self {
            Self::DuplicateHeader {
                header,
                first,
                second,
                ..
            } => Self::DuplicateHeader {
                sheet: name.to_string(),
                header,
                first,
                second,
            },
            Self::MissingField {
                field,
                aliases,
                headers,
                ..
            } => Self::MissingField {
                sheet: name.to_string(),
                field,
                aliases,
                headers,
            },
            other => other,
        }
    }
}
