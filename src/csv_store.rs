use std::path::{Path, PathBuf};

use crate::remote::{RemoteError, RemoteStore, SheetRange, ValueInputOption};

/// A local CSV file standing in for the remote sheet. CSV row 0 is
/// spreadsheet row 1. Values are stored as typed regardless of the input
/// option.
pub struct CsvStore {
    path: PathBuf,
    sheet_name: String,
}

impl CsvStore {
    pub fn new(path: PathBuf, sheet_name: impl Into<String>) -> Self {
        Self {
            path,
            sheet_name: sheet_name.into(),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_range(&self, range: &str) -> Result<SheetRange, RemoteError> {
        let parsed = SheetRange::parse(range)?;
        if parsed.sheet != self.sheet_name {
            return Err(RemoteError::Range(range.to_string()));
        }
        Ok(parsed)
    }
}

impl RemoteStore for CsvStore {
    fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>, RemoteError> {
        let range = self.parse_range(range)?;
        let cells = read_rows(&self.path)?;

        let mut values: Vec<Vec<String>> = cells
            .into_iter()
            .skip(range.start.row)
            .take(range.rows())
            .map(|row| {
                let mut row: Vec<String> = row
                    .into_iter()
                    .skip(range.start.col)
                    .take(range.cols())
                    .collect();
                trim_trailing_empty(&mut row);
                row
            })
            .collect();

        while values.last().is_some_and(|row| row.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    fn update(
        &mut self,
        range: &str,
        values: Vec<Vec<String>>,
        _input: ValueInputOption,
    ) -> Result<(), RemoteError> {
        let range = self.parse_range(range)?;
        let mut cells = read_rows(&self.path)?;

        for (row_offset, row) in values.into_iter().take(range.rows()).enumerate() {
            let row_idx = range.start.row + row_offset;
            if cells.len() <= row_idx {
                cells.resize_with(row_idx + 1, Vec::new);
            }
            for (col_offset, value) in row.into_iter().take(range.cols()).enumerate() {
                let col_idx = range.start.col + col_offset;
                let target = &mut cells[row_idx];
                if target.len() <= col_idx {
                    target.resize(col_idx + 1, String::new());
                }
                target[col_idx] = value;
            }
        }

        write_rows(&self.path, cells.iter().map(Vec::as_slice))?;
        Ok(())
    }
}

fn trim_trailing_empty(row: &mut Vec<String>) {
    while row.last().is_some_and(|cell| cell.is_empty()) {
        row.pop();
    }
}

/// Read a CSV file into rows of strings. A missing file reads as empty.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, csv::Error> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Write rows of strings to a CSV file, padding to a rectangle.
pub fn write_rows<'a>(
    path: &Path,
    rows: impl Iterator<Item = &'a [String]> + Clone,
) -> Result<(), csv::Error> {
    let width = rows.clone().map(<[String]>::len).max().unwrap_or(0);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    for row in rows {
        let record: Vec<&str> = (0..width)
            .map(|col| row.get(col).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> CsvStore {
        CsvStore::new(dir.path().join("sheet.csv"), "Sheet1")
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir).get("Sheet1!A1:H1").unwrap().is_empty());
    }

    #[test]
    fn get_slices_the_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        std::fs::write(
            store.path(),
            "Shot,Artist,Status\nsh010,Ana,Finished\nsh020,,\n",
        )
        .unwrap();

        assert_eq!(
            store.get("Sheet1!A1:C1").unwrap(),
            vec![vec!["Shot", "Artist", "Status"]]
        );
        // Trailing blanks are omitted, like the Sheets API does.
        assert_eq!(
            store.get("Sheet1!B2:C11").unwrap(),
            vec![vec!["Ana", "Finished"]]
        );
    }

    #[test]
    fn update_grows_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        store
            .update("Sheet1!C3", vec![vec!["X".into()]], ValueInputOption::UserEntered)
            .unwrap();

        assert_eq!(store.get("Sheet1!C3").unwrap(), vec![vec!["X"]]);
        let raw = read_rows(store.path()).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[2], vec!["", "", "X"]);
    }

    #[test]
    fn update_keeps_neighbours() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(&dir);
        std::fs::write(store.path(), "a,b\nc,d\n").unwrap();
        store
            .update("Sheet1!B2", vec![vec!["z".into()]], ValueInputOption::UserEntered)
            .unwrap();
        assert_eq!(
            read_rows(store.path()).unwrap(),
            vec![vec!["a", "b"], vec!["c", "z"]]
        );
    }

    #[test]
    fn other_sheets_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            store(&dir).get("Sheet2!A1"),
            Err(RemoteError::Range(_))
        ));
    }
}
