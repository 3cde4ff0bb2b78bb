// Excel import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import reads the first sheet only; its first row is the header row.
// Export writes a single result sheet: bold frozen header, numbers as numbers,
// blanks for "no credit".

use std::path::Path;
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use regrade_recon::{Cell, Table};

use crate::error::IoError;
use crate::{ExportReport, ImportReport};

/// Sheet name used for exported results.
pub const RESULT_SHEET: &str = "Результат";

/// Excel row limit (1-based 1_048_576 rows, header included).
const MAX_ROWS: usize = 1_048_576;

/// Data rows must fit under the header row.
fn check_row_limit(rows: usize) -> Result<(), IoError> {
    let max = MAX_ROWS - 1;
    if rows > max {
        return Err(IoError::TooManyRows { rows, max });
    }
    Ok(())
}

pub fn import(path: &Path) -> Result<(Table, ImportReport), IoError> {
    let start_time = Instant::now();

    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IoError::NoSheets)?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| data_to_cell(c).to_string().trim().to_string()).collect(),
        None => return Err(IoError::NoHeader),
    };

    let mut table = Table::new(headers);
    let mut report = ImportReport {
        sheet: Some(sheet_name),
        ..ImportReport::default()
    };

    for row in rows {
        let cells: Vec<Cell> = row.iter().map(data_to_cell).collect();
        if cells.iter().all(Cell::is_empty) {
            report.empty_rows_skipped += 1;
            continue;
        }
        table.rows.push(cells);
    }

    report.rows_imported = table.row_count();
    report.import_duration_ms = start_time.elapsed().as_millis();
    Ok((table, report))
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::text(if *b { "TRUE" } else { "FALSE" }),
        // Error cells (#N/A, #DIV/0!) keep their text; the engine reads them as absent.
        Data::Error(e) => Cell::text(format!("#{:?}", e)),
        // Serial number, same as the spreadsheet stores it
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.clone()),
    }
}

/// Export a table as an XLSX workbook with a single result sheet.
pub fn export(table: &Table, path: &Path) -> Result<ExportReport, IoError> {
    let start_time = Instant::now();
    let mut report = ExportReport::default();

    check_row_limit(table.row_count())?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(RESULT_SHEET)?;

    let header_format = Format::new().set_bold();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    let width = table.headers.len();
    for row in 0..table.row_count() {
        let target_row = (row + 1) as u32;
        for col in 0..width {
            match table.cell(row, col) {
                Cell::Empty => {}
                Cell::Number(n) => {
                    worksheet.write_number(target_row, col as u16, *n)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(target_row, col as u16, s)?;
                }
            }
        }
        report.rows_exported += 1;
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    workbook.save(path)?;

    report.export_duration_ms = start_time.elapsed().as_millis();
    Ok(report)
}
