// CSV/TSV import/export of grade sheets

use std::io::Read;
use std::path::Path;

use regrade_recon::{Cell, Table};

use crate::error::IoError;
use crate::ImportReport;

pub fn import(path: &Path) -> Result<(Table, ImportReport), IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_str(&content, delimiter)
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<(Table, ImportReport), IoError> {
    let content = read_file_as_utf8(path)?;
    import_from_str(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the header line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (lines with the header's field count) * field_count
        // Higher field count breaks ties: more columns, likelier delimiter
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed.
///
/// A leading BOM is dropped. Non-UTF-8 bytes are decoded as Windows-1251,
/// which is what Excel writes for Cyrillic CSV exports.
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read { path: path.to_path_buf(), source };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{} is not UTF-8, decoding as Windows-1251", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1251.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Parse CSV text. The first record is the header row; records with no
/// non-blank field are skipped.
pub fn import_from_str(content: &str, delimiter: u8) -> Result<(Table, ImportReport), IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
        None => return Err(IoError::NoHeader),
    };

    let mut table = Table::new(headers);
    let mut report = ImportReport::default();

    for result in records {
        let record = result?;
        let row: Vec<Cell> = record.iter().map(Cell::text).collect();
        if row.iter().all(Cell::is_empty) {
            report.empty_rows_skipped += 1;
            continue;
        }
        table.rows.push(row);
    }

    report.rows_imported = table.row_count();
    Ok((table, report))
}

pub fn export(table: &Table, path: &Path) -> Result<(), IoError> {
    export_with_delimiter(table, path, b',')
}

pub fn export_with_delimiter(table: &Table, path: &Path, delimiter: u8) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    writer.write_record(&table.headers)?;
    let width = table.headers.len();
    for row in 0..table.row_count() {
        let record: Vec<String> = (0..width).map(|col| table.cell(row, col).to_string()).collect();
        writer.write_record(&record)?;
    }

    writer.flush().map_err(|source| IoError::Write { path: path.to_path_buf(), source })?;
    Ok(())
}
