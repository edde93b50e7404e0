mod auth;
mod cell;
mod classify;
mod csv_store;
mod grid;
mod menu;
mod mirror;
mod remote;
mod settings;
mod sheets_client;
mod state;
mod sync_state;
mod table;
mod theme;
mod tracker;

use gpui::*;
use tracing_subscriber::EnvFilter;

use cell::*;
use grid::*;
use settings::Settings;
use theme::Theme;
use tracker::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shot_tracker=info")),
        )
        .init();

    let settings = Settings::load();
    log::info!(
        "Starting shot tracker ({:?} backend, sheet {})",
        settings.backend,
        settings.sheet_name
    );

    Application::new().run(move |cx| {
        Theme::init(cx);
        menu::setup_menu(cx);

        cx.bind_keys([
            // Normal mode navigation
            KeyBinding::new("up", MoveUp, Some("NormalMode")),
            KeyBinding::new("down", MoveDown, Some("NormalMode")),
            KeyBinding::new("left", MoveLeft, Some("NormalMode")),
            KeyBinding::new("right", MoveRight, Some("NormalMode")),
            KeyBinding::new("k", MoveUp, Some("NormalMode")),
            KeyBinding::new("j", MoveDown, Some("NormalMode")),
            KeyBinding::new("h", MoveLeft, Some("NormalMode")),
            KeyBinding::new("l", MoveRight, Some("NormalMode")),
            KeyBinding::new("i", EnterEditMode, Some("NormalMode")),
            KeyBinding::new("enter", EnterEditMode, Some("NormalMode")),

            // Edit mode
            KeyBinding::new("enter", ExitAndMoveDown, Some("EditMode")),
            KeyBinding::new("tab", ExitAndMoveRight, Some("EditMode")),
            KeyBinding::new("secondary-enter", ExitEditMode, Some("EditMode")),
            KeyBinding::new("escape", CancelEdit, Some("EditMode")),

            // Text editing in the cell editor
            KeyBinding::new("backspace", Backspace, Some("CellEditor")),
            KeyBinding::new("delete", Delete, Some("CellEditor")),
            KeyBinding::new("left", Left, Some("CellEditor")),
            KeyBinding::new("right", Right, Some("CellEditor")),
            KeyBinding::new("shift-left", SelectLeft, Some("CellEditor")),
            KeyBinding::new("shift-right", SelectRight, Some("CellEditor")),
            KeyBinding::new("secondary-a", SelectAll, Some("CellEditor")),
            KeyBinding::new("home", Home, Some("CellEditor")),
            KeyBinding::new("end", End, Some("CellEditor")),
            KeyBinding::new("secondary-v", Paste, Some("CellEditor")),
            KeyBinding::new("secondary-c", Copy, Some("CellEditor")),
            KeyBinding::new("secondary-x", Cut, Some("CellEditor")),

            // Sheet
            KeyBinding::new("secondary-r", ReloadSheet, None),
            KeyBinding::new("secondary-e", ExportCsv, None),

            // Global
            KeyBinding::new("secondary-q", Quit, None),
        ]);

        cx.on_action::<Quit>(|_, cx| {
            cx.quit();
        });

        let window_options = WindowOptions {
            window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                None,
                size(px(1000.), px(420.)),
                cx,
            ))),
            titlebar: Some(TitlebarOptions {
                title: Some("Shot Tracker".into()),
                appears_transparent: false,
                ..Default::default()
            }),
            window_min_size: Some(size(px(MIN_WINDOW_WIDTH), px(MIN_WINDOW_HEIGHT))),
            ..Default::default()
        };

        let opened = cx.open_window(window_options, |window, cx| {
            cx.new(|cx| SheetTracker::new(&settings, window, cx))
        });
        if let Err(e) = opened {
            log::error!("Failed to open window: {}", e);
            cx.quit();
        }
    });
}
