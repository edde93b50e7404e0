use std::path::Path;

use thiserror::Error;

use crate::classify::{classify_rows, Category};
use crate::csv_store;
use crate::remote::{RemoteError, RemoteStore, ValueInputOption};
use crate::settings::Settings;
use crate::state::CellPosition;
use crate::table::{Grid, Header};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("cell {0} is outside the mirrored range")]
    OutOfBounds(String),
    #[error("failed to write {range}: {source}")]
    Write {
        range: String,
        #[source]
        source: RemoteError,
    },
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

/// In-memory copy of the header row and a fixed block of data rows, kept in
/// positional correspondence with the remote sheet.
pub struct TableMirror<S> {
    store: S,
    sheet_name: String,
    header_range: String,
    data_range: String,
    data_rows: usize,
    header: Header,
    grid: Grid,
    categories: Vec<Category>,
}

impl<S: RemoteStore> TableMirror<S> {
    /// An empty mirror. Nothing is fetched until [`TableMirror::load`].
    pub fn new(store: S, settings: &Settings) -> Self {
        Self {
            store,
            sheet_name: settings.sheet_name.clone(),
            header_range: settings.header_range(),
            data_range: settings.data_range(),
            data_rows: settings.data_rows,
            header: Header::default(),
            grid: Grid::default(),
            categories: Vec::new(),
        }
    }

    /// Fetch the header and data ranges, replacing the current contents.
    ///
    /// On failure the mirror keeps whatever was fetched before the error (an
    /// empty grid, or the header alone) and the error is returned for display.
    pub fn load(&mut self) -> Result<(), RemoteError> {
        self.header = Header::default();
        self.grid = Grid::default();

        let result = self.fetch();
        self.refresh_categories();

        match &result {
            Ok(()) => log::info!(
                "Loaded {} rows x {} columns from {}",
                self.grid.row_count(),
                self.grid.col_count(),
                self.data_range
            ),
            Err(e) => log::error!("Failed to load {}: {}", self.sheet_name, e),
        }
        result
    }

    /// Discard local state and fetch again. Edits already written are read
    /// back from the store.
    pub fn reload(&mut self) -> Result<(), RemoteError> {
        log::info!("Reloading {}", self.data_range);
        self.load()
    }

    fn fetch(&mut self) -> Result<(), RemoteError> {
        self.header = Header::from_rows(self.store.get(&self.header_range)?);
        let rows = self.store.get(&self.data_range)?;
        self.grid = Grid::from_rows(rows, self.data_rows, self.header.len());
        Ok(())
    }

    /// Write one edited cell back to its mirrored remote coordinate and
    /// recolor. If the write fails the cell is restored to its old value.
    pub fn on_cell_edited(&mut self, pos: CellPosition, value: String) -> Result<(), MirrorError> {
        if !self.grid.contains(pos) {
            return Err(MirrorError::OutOfBounds(pos.to_remote_reference()));
        }

        let range = pos.to_remote_range(&self.sheet_name);
        let previous = self.grid.set(pos, value.clone()).unwrap_or_default();

        log::debug!("Writing {} = {:?}", range, value);
        if let Err(source) = self
            .store
            .update(&range, vec![vec![value]], ValueInputOption::UserEntered)
        {
            log::warn!("Write to {} failed, reverting: {}", range, source);
            self.grid.set(pos, previous);
            return Err(MirrorError::Write { range, source });
        }

        self.refresh_categories();
        Ok(())
    }

    /// Snapshot the header and grid to a local CSV file.
    pub fn export_csv(&self, path: &Path) -> Result<(), MirrorError> {
        let rows = std::iter::once(self.header.titles()).chain(self.grid.rows());
        csv_store::write_rows(path, rows)?;
        log::info!("Exported {} rows to {}", self.grid.row_count(), path.display());
        Ok(())
    }

    fn refresh_categories(&mut self) {
        self.categories = classify_rows(&self.grid);
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }
}
