use gpui::*;

use crate::csv_store::CsvStore;
use crate::grid::{CellsEdited, SpreadsheetGrid};
use crate::mirror::TableMirror;
use crate::remote::{RemoteError, RemoteStore, Unavailable};
use crate::settings::{Backend, Settings};
use crate::sheets_client::SheetsClient;
use crate::sync_state::SyncState;
use crate::Theme;

actions!(tracker, [ReloadSheet, ExportCsv, Quit]);

/// Open the configured backend. A backend that cannot be opened still yields
/// a store, one that reports why on every call, so the window comes up empty
/// with the reason in the footer.
fn open_store(settings: &Settings) -> (Box<dyn RemoteStore>, String) {
    match settings.backend {
        Backend::Csv => {
            let path = settings.csv_path();
            let source = path.display().to_string();
            (Box::new(CsvStore::new(path, settings.sheet_name.clone())), source)
        }
        Backend::Sheets => {
            let source = format!("{} @ Google Sheets", settings.sheet_name);
            match SheetsClient::from_settings(settings) {
                Ok(client) => (Box::new(client), source),
                Err(e) => {
                    log::error!("Google Sheets backend unavailable: {}", e);
                    (Box::new(Unavailable::new(e.to_string())), source)
                }
            }
        }
    }
}

/// Application state: the mirror of the remote table and the grid showing it.
pub struct SheetTracker {
    mirror: TableMirror<Box<dyn RemoteStore>>,
    grid: Entity<SpreadsheetGrid>,
    _edits: Subscription,
}

impl SheetTracker {
    pub fn new(settings: &Settings, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let (store, source) = open_store(settings);
        let tracker = Self::with_store(store, source, settings, cx);

        let focus_handle = tracker.grid.focus_handle(cx);
        focus_handle.focus(window);
        tracker
    }

    fn with_store(
        store: Box<dyn RemoteStore>,
        source: String,
        settings: &Settings,
        cx: &mut Context<Self>,
    ) -> Self {
        let grid = cx.new(|cx| SpreadsheetGrid::new(SyncState::new(source), cx));
        let edits = cx.subscribe(&grid, Self::on_cells_edited);

        let mut tracker = Self {
            mirror: TableMirror::new(store, settings),
            grid,
            _edits: edits,
        };
        tracker.load(cx);
        tracker
    }

    fn load(&mut self, cx: &mut Context<Self>) {
        let result = self.mirror.load();
        self.show_loaded(result, cx);
    }

    fn show_loaded(&mut self, result: Result<(), RemoteError>, cx: &mut Context<Self>) {
        let mirror = &self.mirror;
        self.grid.update(cx, |grid, cx| {
            grid.show_table(mirror.header(), mirror.grid(), mirror.categories(), cx);
            grid.update_sync(cx, |sync| match result {
                Ok(()) => sync.mark_synced(),
                Err(e) => sync.mark_failed(format!("Load failed: {}", e)),
            });
        });
    }

    /// Write each edited cell back through the mirror, then refresh the grid
    /// from the mirror so failed writes show their restored value.
    fn on_cells_edited(
        &mut self,
        grid: Entity<SpreadsheetGrid>,
        event: &CellsEdited,
        cx: &mut Context<Self>,
    ) {
        let edits: Vec<_> = {
            let grid = grid.read(cx);
            event
                .positions()
                .filter_map(|pos| grid.value(pos).map(|value| (pos, value.to_string())))
                .collect()
        };

        let mut written = 0;
        let mut failure = None;
        for (pos, value) in edits {
            match self.mirror.on_cell_edited(pos, value) {
                Ok(()) => written += 1,
                Err(e) => failure = Some(e.to_string()),
            }
        }

        let mirror = &self.mirror;
        grid.update(cx, |grid, cx| {
            grid.show_table(mirror.header(), mirror.grid(), mirror.categories(), cx);
            grid.update_sync(cx, |sync| {
                sync.mark_written(written);
                if let Some(message) = failure {
                    sync.mark_failed(message);
                }
            });
        });
    }

    fn reload(&mut self, _: &ReloadSheet, _window: &mut Window, cx: &mut Context<Self>) {
        let result = self.mirror.reload();
        self.show_loaded(result, cx);
    }

    fn export_csv(&mut self, _: &ExportCsv, window: &mut Window, cx: &mut Context<Self>) {
        let path = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(format!("{}.csv", self.mirror.sheet_name()))
            .save_file();

        if let Some(path) = path {
            if let Err(e) = self.mirror.export_csv(&path) {
                log::error!("Failed to export {}: {}", path.display(), e);
                self.grid.update(cx, |grid, cx| {
                    grid.update_sync(cx, |sync| sync.mark_failed(e.to_string()));
                });
            }
        }

        let focus_handle = self.grid.focus_handle(cx);
        focus_handle.focus(window);
    }
}

impl Render for SheetTracker {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.global::<Theme>();

        div()
            .flex()
            .flex_col()
            .size_full()
            .bg(theme.base)
            .text_color(theme.text)
            .font_family("Berkeley Mono")
            .on_action(cx.listener(Self::reload))
            .on_action(cx.listener(Self::export_csv))
            .child(self.grid.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use gpui::{AppContext, TestAppContext};

    use super::SheetTracker;
    use crate::remote::{RemoteError, RemoteStore, ValueInputOption};
    use crate::settings::Settings;
    use crate::state::CellPosition;

    type Writes = Rc<RefCell<Vec<(String, Vec<Vec<String>>, ValueInputOption)>>>;

    /// Canned reads; writes are shared with the test so they can be inspected
    /// after the store is boxed into the tracker.
    struct SharedStore {
        ranges: HashMap<String, Vec<Vec<String>>>,
        writes: Writes,
        fail_writes: Rc<Cell<bool>>,
    }

    impl RemoteStore for SharedStore {
        fn get(&mut self, range: &str) -> Result<Vec<Vec<String>>, RemoteError> {
            Ok(self.ranges.get(range).cloned().unwrap_or_default())
        }

        fn update(
            &mut self,
            range: &str,
            values: Vec<Vec<String>>,
            input: ValueInputOption,
        ) -> Result<(), RemoteError> {
            if self.fail_writes.get() {
                return Err(RemoteError::Network("connection reset".into()));
            }
            self.writes.borrow_mut().push((range.to_string(), values, input));
            Ok(())
        }
    }

    fn strings(row: &[&str]) -> Vec<String> {
        row.iter().map(|s| s.to_string()).collect()
    }

    #[gpui::test]
    fn grid_edits_write_through_and_failures_revert(cx: &mut TestAppContext) {
        let writes = Writes::default();
        let fail_writes = Rc::new(Cell::new(false));
        let mut ranges = HashMap::new();
        ranges.insert("Sheet1!A1:B1".to_string(), vec![strings(&["Shot", "Status"])]);
        ranges.insert("Sheet1!A2:B3".to_string(), vec![strings(&["sh010", "In Progress"])]);
        let store = SharedStore {
            ranges,
            writes: writes.clone(),
            fail_writes: fail_writes.clone(),
        };
        let settings = Settings {
            columns: 2,
            data_rows: 2,
            ..Default::default()
        };

        let tracker = cx.new(|cx| {
            SheetTracker::with_store(Box::new(store), "test".into(), &settings, cx)
        });
        let grid = tracker.read_with(cx, |tracker, _| tracker.grid.clone());

        grid.update(cx, |grid, cx| grid.edit_selected("X", cx));
        assert_eq!(
            *writes.borrow(),
            vec![(
                "Sheet1!A2".to_string(),
                vec![vec!["X".to_string()]],
                ValueInputOption::UserEntered
            )]
        );
        grid.read_with(cx, |grid, _| {
            assert_eq!(grid.value(CellPosition::new(0, 0)), Some("X"));
            assert!(!grid.sync().is_failed());
            assert_eq!(grid.sync().status_text(), "Synced (1 edits)");
        });

        fail_writes.set(true);
        grid.update(cx, |grid, cx| {
            grid.select(CellPosition::new(0, 1));
            grid.edit_selected("Finished", cx);
        });
        assert_eq!(writes.borrow().len(), 1);
        grid.read_with(cx, |grid, _| {
            assert_eq!(grid.value(CellPosition::new(0, 1)), Some("In Progress"));
            assert!(grid.sync().is_failed());
            assert!(grid.sync().status_text().contains("Sheet1!B2"));
        });
        tracker.read_with(cx, |tracker, _| {
            assert_eq!(tracker.mirror.grid().get(CellPosition::new(0, 1)), Some("In Progress"));
        });
    }

    #[gpui::test]
    fn failed_load_is_reported_in_the_footer(cx: &mut TestAppContext) {
        let settings = Settings::default();
        let tracker = cx.new(|cx| {
            SheetTracker::with_store(
                Box::new(crate::remote::Unavailable::new("not signed in")),
                "test".into(),
                &settings,
                cx,
            )
        });
        let grid = tracker.read_with(cx, |tracker, _| tracker.grid.clone());

        grid.read_with(cx, |grid, _| {
            assert!(grid.sync().is_failed());
            assert_eq!(grid.sync().status_text(), "Load failed: not signed in");
            assert_eq!(grid.value(CellPosition::new(0, 0)), None);
        });
    }
}
