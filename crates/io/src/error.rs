use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to open spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("spreadsheet contains no sheets")]
    NoSheets,
    #[error("file has no header row")]
    NoHeader,
    #[error("failed to write XLSX file: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("{rows} data rows exceed the XLSX limit of {max}")]
    TooManyRows { rows: usize, max: usize },
    #[error("unsupported file type '{0}' (expected csv, tsv, xlsx, xlsm, xls, xlsb or ods)")]
    UnsupportedFormat(String),
    #[error("invalid date format '{0}'")]
    DateFormat(String),
}
