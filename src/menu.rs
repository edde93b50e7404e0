use gpui::*;

use crate::cell::{Copy, Cut, Paste};
use crate::tracker::{ExportCsv, Quit, ReloadSheet};

/// Set up the application menu bar
pub fn setup_menu(cx: &mut App) {
    cx.set_menus(vec![
        Menu {
            name: "Shot Tracker".into(),
            items: vec![MenuItem::action("Quit", Quit)],
        },
        Menu {
            name: "Sheet".into(),
            items: vec![
                MenuItem::action("Reload", ReloadSheet),
                MenuItem::separator(),
                MenuItem::action("Export as CSV...", ExportCsv),
            ],
        },
        Menu {
            name: "Edit".into(),
            items: vec![
                MenuItem::action("Cut", Cut),
                MenuItem::action("Copy", Copy),
                MenuItem::action("Paste", Paste),
            ],
        },
    ]);
}
