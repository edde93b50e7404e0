// Remote store contract
// Two calls against a tabular resource addressed by A1 ranges: read a block
// of values and overwrite a block of values.

use std::fmt;

use thiserror::Error;

use crate::auth::AuthError;
use crate::state::{quote_sheet_name, unquote_sheet_name, CellPosition};

/// How the store should interpret written values. Edits are always written
/// as if typed into the sheet UI, so formulas, numbers and dates are parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueInputOption {
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("invalid range `{0}`")]
    Range(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub trait RemoteStore {
    /// Read the values in `range`, row-major. Trailing empty cells and rows
    /// may be omitted by the store.
    fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>, RemoteError>;

    /// Overwrite `range` with `values`, row-major.
    fn update(
        &mut self,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<(), RemoteError>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for Box<T> {
    fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>, RemoteError> {
        (**self).get(range)
    }

    fn update(
        &mut self,
        range: &str,
        values: Vec<Vec<String>>,
        input: ValueInputOption,
    ) -> Result<(), RemoteError> {
        (**self).update(range, values, input)
    }
}

/// Stands in when no backend could be opened; every call fails with the
/// reason it could not be opened.
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl RemoteStore for Unavailable {
    fn get(&mut self, _range: &str) -> Result<Vec<Vec<String>>, RemoteError> {
        Err(RemoteError::Unavailable(self.reason.clone()))
    }

    fn update(
        &mut self,
        _range: &str,
        _values: Vec<Vec<String>>,
        _input: ValueInputOption,
    ) -> Result<(), RemoteError> {
        Err(RemoteError::Unavailable(self.reason.clone()))
    }
}

/// A parsed A1 range such as `Sheet1!A2:H11` or `Sheet1!A2`. Positions are
/// zero-based remote coordinates (row 0 is spreadsheet row 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub start: CellPosition,
    pub end: CellPosition,
}

impl SheetRange {
    pub fn parse(input: &str) -> Result<Self, RemoteError> {
        let invalid = || RemoteError::Range(input.to_string());

        let (sheet, cells) = input.rsplit_once('!').ok_or_else(invalid)?;
        let sheet = unquote_sheet_name(sheet);
        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (start, end),
            None => (cells, cells),
        };
        let start = parse_cell(start).ok_or_else(invalid)?;
        let end = parse_cell(end).ok_or_else(invalid)?;
        if end.row < start.row || end.col < start.col {
            return Err(invalid());
        }

        Ok(Self { sheet, start, end })
    }

    pub fn rows(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> usize {
        self.end.col - self.start.col + 1
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |pos: &CellPosition| {
            format!("{}{}", CellPosition::col_to_letter(pos.col), pos.row + 1)
        };
        if self.start == self.end {
            write!(f, "{}!{}", quote_sheet_name(&self.sheet), cell(&self.start))
        } else {
            write!(f, "{}!{}:{}", quote_sheet_name(&self.sheet), cell(&self.start), cell(&self.end))
        }
    }
}

fn parse_cell(cell: &str) -> Option<CellPosition> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    let col = CellPosition::letter_to_col(letters)?;
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some(CellPosition::new(row - 1, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_block_range() {
        let range = SheetRange::parse("Sheet1!A2:H11").unwrap();
        assert_eq!(range.sheet, "Sheet1");
        assert_eq!(range.start, CellPosition::new(1, 0));
        assert_eq!(range.end, CellPosition::new(10, 7));
        assert_eq!(range.rows(), 10);
        assert_eq!(range.cols(), 8);
        assert_eq!(range.to_string(), "Sheet1!A2:H11");
    }

    #[test]
    fn parses_single_cell() {
        let range = SheetRange::parse("'Shot List'!C4").unwrap();
        assert_eq!(range.sheet, "Shot List");
        assert_eq!(range.start, range.end);
        assert_eq!(range.to_string(), "'Shot List'!C4");
    }

    #[test]
    fn rejects_malformed_ranges() {
        for bad in ["A1:B2", "Sheet1!", "Sheet1!A0", "Sheet1!11", "Sheet1!B2:A1", "Sheet1!A1:B"] {
            assert!(matches!(SheetRange::parse(bad), Err(RemoteError::Range(_))), "{bad}");
        }
    }

    #[test]
    fn unavailable_store_reports_reason() {
        let mut store = Unavailable::new("not signed in");
        let err = store.get("Sheet1!A1:H1").unwrap_err();
        assert_eq!(err.to_string(), "not signed in");
        assert!(store
            .update("Sheet1!A2", vec![vec!["X".into()]], ValueInputOption::UserEntered)
            .is_err());
    }

    #[test]
    fn input_option_wire_name() {
        assert_eq!(ValueInputOption::UserEntered.as_str(), "USER_ENTERED");
    }
}
