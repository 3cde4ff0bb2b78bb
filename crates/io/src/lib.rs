// File I/O for grade sheets

pub mod csv;
pub mod error;
pub mod xlsx;

use std::fmt::Write as _;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use regrade_recon::Table;

pub use error::IoError;
pub use xlsx::RESULT_SHEET;

/// Default date stamp in result file names (day-month-two-digit-year).
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%y";

/// Prefix of generated result file names.
pub const RESULT_PREFIX: &str = "Результат";

/// What an import saw, for the run summary.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Sheet that was read (spreadsheets only).
    pub sheet: Option<String>,
    pub rows_imported: usize,
    pub empty_rows_skipped: usize,
    pub import_duration_ms: u128,
}

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub rows_exported: usize,
    pub export_duration_ms: u128,
}

/// Readable input formats, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(FileFormat::Spreadsheet),
            _ => Err(IoError::UnsupportedFormat(ext)),
        }
    }
}

/// Writable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(IoError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Read a grade sheet. CSV delimiters are sniffed; spreadsheets use the first sheet.
pub fn import(path: &Path) -> Result<(Table, ImportReport), IoError> {
    let format = FileFormat::from_path(path)?;
    log::debug!("importing {} as {:?}", path.display(), format);

    match format {
        FileFormat::Csv => csv::import(path),
        FileFormat::Tsv => csv::import_with_delimiter(path, b'\t'),
        FileFormat::Spreadsheet => xlsx::import(path),
    }
}

pub fn export(table: &Table, path: &Path, format: ExportFormat) -> Result<ExportReport, IoError> {
    log::debug!("exporting {} rows to {}", table.row_count(), path.display());

    match format {
        ExportFormat::Xlsx => xlsx::export(table, path),
        ExportFormat::Csv => {
            csv::export(table, path)?;
            Ok(ExportReport {
                rows_exported: table.row_count(),
                ..ExportReport::default()
            })
        }
    }
}

/// Name of the result file for an input file: `Результат_<stem>_<date>.<ext>`.
///
/// The stem is the input file name up to its first dot, so `группа.осень.xlsx`
/// becomes `группа`.
pub fn result_file_name(
    input: &Path,
    date: NaiveDate,
    format: ExportFormat,
    date_format: &str,
) -> Result<String, IoError> {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();

    let stamp = format_date(date, date_format)?;
    Ok(format!("{RESULT_PREFIX}_{stem}_{stamp}.{}", format.extension()))
}

/// Format a date, rejecting strftime patterns chrono cannot render.
pub fn format_date(date: NaiveDate, date_format: &str) -> Result<String, IoError> {
    let items: Vec<Item> = StrftimeItems::new(date_format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(IoError::DateFormat(date_format.to_string()));
    }

    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.into_iter()))
        .map_err(|_| IoError::DateFormat(date_format.to_string()))?;

    // Path separators would turn the stamp into a directory.
    if out.contains(['/', '\\']) {
        return Err(IoError::DateFormat(date_format.to_string()));
    }
    Ok(out)
}
