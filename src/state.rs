/// Remote spreadsheet row holding the column titles.
pub const HEADER_REMOTE_ROW: usize = 1;

/// Sheet name as written in an A1 range. Names other than plain
/// letters, digits and underscores are single-quoted, with embedded quotes
/// doubled.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Inverse of [`quote_sheet_name`].
pub fn unquote_sheet_name(name: &str) -> String {
    match name.strip_prefix('\'').and_then(|n| n.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => name.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Remote row this grid row is mirrored to (1-based, below the header).
    pub fn remote_row(&self) -> usize {
        self.row + HEADER_REMOTE_ROW + 1
    }

    /// Remote column letter this grid column is mirrored to.
    pub fn remote_column(&self) -> String {
        Self::col_to_letter(self.col)
    }

    /// A1 reference of the mirrored remote cell, e.g. `A2` for grid cell (0, 0).
    pub fn to_remote_reference(&self) -> String {
        format!("{}{}", self.remote_column(), self.remote_row())
    }

    /// Fully qualified single-cell range, e.g. `Sheet1!A2`.
    pub fn to_remote_range(&self, sheet_name: &str) -> String {
        format!("{}!{}", quote_sheet_name(sheet_name), self.to_remote_reference())
    }

    pub fn col_to_letter(col: usize) -> String {
        let mut result = String::new();
        let mut n = col;
        loop {
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            if n < 26 {
                break;
            }
            n = n / 26 - 1;
        }
        result
    }

    /// Inverse of [`CellPosition::col_to_letter`]. Returns `None` for anything
    /// that is not a run of ASCII letters.
    pub fn letter_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }
        let mut n: usize = 0;
        for ch in letters.chars() {
            if !ch.is_ascii_alphabetic() {
                return None;
            }
            let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            n = n.checked_mul(26)?.checked_add(digit)?;
        }
        Some(n - 1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Edit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_row_is_offset_by_header() {
        for row in 0..50 {
            assert_eq!(CellPosition::new(row, 0).remote_row(), row + 2);
        }
    }

    #[test]
    fn remote_column_is_nth_letter() {
        for col in 0..26 {
            let expected = ((b'A' + col as u8) as char).to_string();
            assert_eq!(CellPosition::new(0, col).remote_column(), expected);
        }
    }

    #[test]
    fn wide_columns_continue_a1_style() {
        assert_eq!(CellPosition::col_to_letter(26), "AA");
        assert_eq!(CellPosition::col_to_letter(27), "AB");
        assert_eq!(CellPosition::col_to_letter(701), "ZZ");
        assert_eq!(CellPosition::col_to_letter(702), "AAA");
    }

    #[test]
    fn letters_round_trip() {
        for col in [0, 7, 25, 26, 51, 701, 702] {
            let letters = CellPosition::col_to_letter(col);
            assert_eq!(CellPosition::letter_to_col(&letters), Some(col));
        }
        assert_eq!(CellPosition::letter_to_col("h"), Some(7));
        assert_eq!(CellPosition::letter_to_col(""), None);
        assert_eq!(CellPosition::letter_to_col("A1"), None);
    }

    #[test]
    fn first_cell_maps_to_a2() {
        let pos = CellPosition::new(0, 0);
        assert_eq!(pos.to_remote_reference(), "A2");
        assert_eq!(pos.to_remote_range("Sheet1"), "Sheet1!A2");
        assert_eq!(CellPosition::new(9, 7).to_remote_range("Sheet1"), "Sheet1!H11");
        assert_eq!(pos.to_remote_range("Shot List"), "'Shot List'!A2");
    }

    #[test]
    fn sheet_names_are_quoted_when_needed() {
        assert_eq!(quote_sheet_name("Sheet1"), "Sheet1");
        assert_eq!(quote_sheet_name("shots_2024"), "shots_2024");
        assert_eq!(quote_sheet_name("Shot List"), "'Shot List'");
        assert_eq!(quote_sheet_name("2024"), "'2024'");
        assert_eq!(quote_sheet_name("Bob's shots"), "'Bob''s shots'");
        for name in ["Sheet1", "Shot List", "Bob's shots"] {
            assert_eq!(unquote_sheet_name(&quote_sheet_name(name)), name);
        }
    }
}
