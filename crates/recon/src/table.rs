//! Plain tabular batch exchanged with the spreadsheet readers and writers.

use std::fmt;

use serde::Serialize;

/// A single spreadsheet cell as delivered by a reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Build a text cell; blank strings become `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric reading of the cell.
    ///
    /// Text is trimmed and accepts a decimal comma ("4,5"). Non-finite values
    /// and anything that does not parse read as `None`, same as a blank cell.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Cell::Empty => return None,
            Cell::Number(n) => *n,
            Cell::Text(s) => {
                let s = s.trim();
                match s.parse::<f64>() {
                    Ok(n) => n,
                    Err(_) => s.replace(',', ".").parse::<f64>().ok()?,
                }
            }
        };
        n.is_finite().then_some(n)
    }

    /// True when the cell holds something that is neither blank nor a number.
    pub fn is_malformed_number(&self) -> bool {
        !self.is_empty() && self.as_number().is_none()
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            // Integers without decimals
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Header row plus data rows. Rows may be ragged; missing trailing cells read
/// as `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Position of the first header equal to `name` (surrounding whitespace ignored).
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
