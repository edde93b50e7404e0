use crate::state::CellPosition;

/// Column titles read from the header row. Fixed once loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    titles: Vec<String>,
}

impl Header {
    /// Build from a remote header fetch. Only the first returned row is used.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            titles: rows.into_iter().next().unwrap_or_default(),
        }
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn title(&self, col: usize) -> Option<&str> {
        self.titles.get(col).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Rectangular block of text cells mirrored from the remote sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<String>>,
    cols: usize,
}

impl Grid {
    pub fn empty(rows: usize, cols: usize) -> Self {
        let cells = (0..rows)
            .map(|_| (0..cols).map(|_| String::new()).collect())
            .collect();
        Self { cells, cols }
    }

    /// Shape remote rows into a `rows` x `cols` grid. The remote store omits
    /// trailing empty cells and rows, so short rows are padded and anything
    /// past the bounds is dropped.
    pub fn from_rows(remote: Vec<Vec<String>>, rows: usize, cols: usize) -> Self {
        let mut grid = Self::empty(rows, cols);
        for (row_idx, row) in remote.into_iter().take(rows).enumerate() {
            for (col_idx, value) in row.into_iter().take(cols).enumerate() {
                grid.cells[row_idx][col_idx] = value;
            }
        }
        grid
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: CellPosition) -> bool {
        pos.row < self.row_count() && pos.col < self.cols
    }

    pub fn get(&self, pos: CellPosition) -> Option<&str> {
        self.cells.get(pos.row)?.get(pos.col).map(String::as_str)
    }

    /// Replace the value at `pos`, returning the previous one.
    pub fn set(&mut self, pos: CellPosition, value: String) -> Option<String> {
        let cell = self.cells.get_mut(pos.row)?.get_mut(pos.col)?;
        Some(std::mem::replace(cell, value))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> + Clone {
        self.cells.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_uses_first_row() {
        let header = Header::from_rows(vec![row(&["Shot", "Artist", "Status"])]);
        assert_eq!(header.len(), 3);
        assert_eq!(header.title(2), Some("Status"));
        assert_eq!(header.title(3), None);
        assert!(Header::from_rows(Vec::new()).is_empty());
    }

    #[test]
    fn short_remote_rows_are_padded() {
        let grid = Grid::from_rows(vec![row(&["a"]), row(&["b", "c"])], 3, 2);
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.col_count(), 2);
        assert_eq!(grid.get(CellPosition::new(0, 1)), Some(""));
        assert_eq!(grid.get(CellPosition::new(1, 1)), Some("c"));
        assert_eq!(grid.rows().nth(2), Some(&[String::new(), String::new()][..]));
    }

    #[test]
    fn overflow_is_dropped() {
        let grid = Grid::from_rows(vec![row(&["a", "b", "c"]), row(&["d"])], 1, 2);
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.rows().next(), Some(&row(&["a", "b"])[..]));
    }

    #[test]
    fn set_returns_previous_value() {
        let mut grid = Grid::empty(2, 2);
        let pos = CellPosition::new(1, 0);
        assert_eq!(grid.set(pos, "x".into()), Some(String::new()));
        assert_eq!(grid.set(pos, "y".into()), Some("x".to_string()));
        assert_eq!(grid.get(pos), Some("y"));
        assert_eq!(grid.set(CellPosition::new(2, 0), "z".into()), None);
        assert!(!grid.contains(CellPosition::new(0, 2)));
    }
}
