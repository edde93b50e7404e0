use gpui::prelude::FluentBuilder;
use gpui::*;

use crate::cell::CellEditor;
use crate::classify::Category;
use crate::state::{CellPosition, Mode};
use crate::sync_state::SyncState;
use crate::table::{Grid, Header};
use crate::Theme;

pub const CELL_WIDTH: f32 = 120.0;
pub const CELL_HEIGHT: f32 = 28.0;
pub const ROW_HEADER_WIDTH: f32 = 50.0;
pub const COLUMN_HEADER_HEIGHT: f32 = 40.0;
pub const HEADER_HEIGHT: f32 = 32.0;
pub const FOOTER_HEIGHT: f32 = 24.0;

// Enough for the reference bar, column titles, one row and the footer
pub const MIN_WINDOW_WIDTH: f32 = ROW_HEADER_WIDTH + CELL_WIDTH;
pub const MIN_WINDOW_HEIGHT: f32 = HEADER_HEIGHT + COLUMN_HEADER_HEIGHT + CELL_HEIGHT + FOOTER_HEIGHT;

// Actions for Normal mode
actions!(
    normal_mode,
    [
        MoveUp,
        MoveDown,
        MoveLeft,
        MoveRight,
        EnterEditMode,
    ]
);

// Actions for Edit mode
actions!(
    edit_mode,
    [
        ExitEditMode,
        CancelEdit,
        ExitAndMoveDown,
        ExitAndMoveRight,
    ]
);

/// Emitted when the user commits a change to one or more cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellsEdited {
    pub top_left: CellPosition,
    pub bottom_right: CellPosition,
}

impl CellsEdited {
    pub fn single(pos: CellPosition) -> Self {
        Self {
            top_left: pos,
            bottom_right: pos,
        }
    }

    /// Every position in the edited rectangle, row by row.
    pub fn positions(&self) -> impl Iterator<Item = CellPosition> + '_ {
        (self.top_left.row..=self.bottom_right.row).flat_map(move |row| {
            (self.top_left.col..=self.bottom_right.col).map(move |col| CellPosition::new(row, col))
        })
    }
}

/// Editable view of the mirrored table. Owns a display copy of the cells;
/// committed edits are reported through [`CellsEdited`].
pub struct SpreadsheetGrid {
    focus_handle: FocusHandle,
    active_input: Entity<CellEditor>,
    header: Header,
    cells: Grid,
    categories: Vec<Category>,
    selected: CellPosition,
    scroll_row: usize,
    scroll_col: usize,
    mode: Mode,
    visible_rows: usize,
    visible_cols: usize,
    sync: SyncState,
}

impl EventEmitter<CellsEdited> for SpreadsheetGrid {}

impl SpreadsheetGrid {
    pub fn new(sync: SyncState, cx: &mut Context<Self>) -> Self {
        let focus_handle = cx.focus_handle();
        let active_input = cx.new(|cx| CellEditor::new(cx));

        Self {
            focus_handle,
            active_input,
            header: Header::default(),
            cells: Grid::default(),
            categories: Vec::new(),
            selected: CellPosition::new(0, 0),
            scroll_row: 0,
            scroll_col: 0,
            mode: Mode::Normal,
            visible_rows: 20,
            visible_cols: 8,
            sync,
        }
    }

    /// Replace the displayed table, keeping the selection where possible.
    pub fn show_table(&mut self, header: &Header, cells: &Grid, categories: &[Category], cx: &mut Context<Self>) {
        self.header = header.clone();
        self.cells = cells.clone();
        self.categories = categories.to_vec();
        self.selected = CellPosition::new(
            self.selected.row.min(cells.row_count().saturating_sub(1)),
            self.selected.col.min(cells.col_count().saturating_sub(1)),
        );
        if self.mode == Mode::Edit && !self.cells.contains(self.selected) {
            self.mode = Mode::Normal;
        }
        self.ensure_visible();
        cx.notify();
    }

    pub fn update_sync(&mut self, cx: &mut Context<Self>, f: impl FnOnce(&mut SyncState)) {
        f(&mut self.sync);
        cx.notify();
    }

    pub fn value(&self, pos: CellPosition) -> Option<&str> {
        self.cells.get(pos)
    }

    #[cfg(test)]
    pub fn sync(&self) -> &SyncState {
        &self.sync
    }

    /// Type `text` into the selected cell and commit it, as the editor would.
    #[cfg(test)]
    pub fn edit_selected(&mut self, text: &str, cx: &mut Context<Self>) {
        if self.load_editor(cx) {
            self.active_input.update(cx, |input, cx| input.set_content(text.to_string(), cx));
            self.commit_edit(cx);
        }
    }

    #[cfg(test)]
    pub fn select(&mut self, pos: CellPosition) {
        self.selected = pos;
    }

    fn move_up(&mut self, _: &MoveUp, window: &mut Window, cx: &mut Context<Self>) {
        self.move_selection(-1, 0, window, cx);
    }

    fn move_down(&mut self, _: &MoveDown, window: &mut Window, cx: &mut Context<Self>) {
        self.move_selection(1, 0, window, cx);
    }

    fn move_left(&mut self, _: &MoveLeft, window: &mut Window, cx: &mut Context<Self>) {
        self.move_selection(0, -1, window, cx);
    }

    fn move_right(&mut self, _: &MoveRight, window: &mut Window, cx: &mut Context<Self>) {
        self.move_selection(0, 1, window, cx);
    }

    fn move_selection(&mut self, delta_row: isize, delta_col: isize, _window: &mut Window, cx: &mut Context<Self>) {
        let max_row = self.cells.row_count().saturating_sub(1) as isize;
        let max_col = self.cells.col_count().saturating_sub(1) as isize;
        let new_row = (self.selected.row as isize + delta_row).clamp(0, max_row) as usize;
        let new_col = (self.selected.col as isize + delta_col).clamp(0, max_col) as usize;

        self.selected = CellPosition::new(new_row, new_col);
        self.ensure_visible();
        cx.notify();
    }

    fn enter_edit_mode(&mut self, _: &EnterEditMode, window: &mut Window, cx: &mut Context<Self>) {
        self.begin_edit(window, cx);
    }

    fn begin_edit(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if !self.load_editor(cx) {
            return;
        }
        let focus_handle = self.active_input.focus_handle(cx);
        focus_handle.focus(window);
    }

    /// Switch to edit mode with the selected cell's value in the editor.
    /// Returns false when nothing is selected.
    fn load_editor(&mut self, cx: &mut Context<Self>) -> bool {
        let Some(content) = self.cells.get(self.selected).map(str::to_string) else {
            return false;
        };
        self.mode = Mode::Edit;
        self.active_input.update(cx, |input, cx| {
            input.set_content(content, cx);
        });
        cx.notify();
        true
    }

    fn exit_edit_mode(&mut self, _: &ExitEditMode, window: &mut Window, cx: &mut Context<Self>) {
        self.commit_and_exit_edit_mode(window, cx);
    }

    fn cancel_edit(&mut self, _: &CancelEdit, window: &mut Window, cx: &mut Context<Self>) {
        self.mode = Mode::Normal;
        self.focus_handle.focus(window);
        cx.notify();
    }

    fn exit_and_move_down(&mut self, _: &ExitAndMoveDown, window: &mut Window, cx: &mut Context<Self>) {
        self.commit_and_exit_edit_mode(window, cx);
        self.move_selection(1, 0, window, cx);
    }

    fn exit_and_move_right(&mut self, _: &ExitAndMoveRight, window: &mut Window, cx: &mut Context<Self>) {
        self.commit_and_exit_edit_mode(window, cx);
        self.move_selection(0, 1, window, cx);
    }

    fn commit_and_exit_edit_mode(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.mode != Mode::Edit {
            return;
        }
        self.commit_edit(cx);
        self.focus_handle.focus(window);
    }

    /// Leave edit mode, keeping the editor's text. Emits [`CellsEdited`] only
    /// when the value actually changed.
    fn commit_edit(&mut self, cx: &mut Context<Self>) {
        if self.mode != Mode::Edit {
            return;
        }
        let content = self.active_input.read(cx).get_content();
        let pos = self.selected;
        if self.cells.get(pos).is_some_and(|old| old != content) {
            self.cells.set(pos, content);
            cx.emit(CellsEdited::single(pos));
        }

        self.mode = Mode::Normal;
        cx.notify();
    }

    fn ensure_visible(&mut self) {
        if self.selected.row < self.scroll_row {
            self.scroll_row = self.selected.row;
        } else if self.selected.row >= self.scroll_row + self.visible_rows {
            self.scroll_row = self.selected.row.saturating_sub(self.visible_rows - 1);
        }

        if self.selected.col < self.scroll_col {
            self.scroll_col = self.selected.col;
        } else if self.selected.col >= self.scroll_col + self.visible_cols {
            self.scroll_col = self.selected.col.saturating_sub(self.visible_cols - 1);
        }
    }

    fn on_cell_click(&mut self, row: usize, col: usize, window: &mut Window, cx: &mut Context<Self>) {
        if self.mode == Mode::Edit && (row != self.selected.row || col != self.selected.col) {
            self.commit_and_exit_edit_mode(window, cx);
        }

        self.selected = CellPosition::new(row, col);
        self.ensure_visible();
        cx.notify();
    }

    fn on_cell_double_click(&mut self, row: usize, col: usize, window: &mut Window, cx: &mut Context<Self>) {
        self.commit_and_exit_edit_mode(window, cx);
        self.selected = CellPosition::new(row, col);
        self.ensure_visible();
        self.begin_edit(window, cx);
    }

    fn render_header(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.global::<Theme>();
        let has_cell = self.cells.contains(self.selected);
        let cell_ref = if has_cell {
            self.selected.to_remote_reference()
        } else {
            String::new()
        };
        let content = if self.mode == Mode::Edit {
            self.active_input.read(cx).get_content()
        } else {
            self.cells.get(self.selected).unwrap_or_default().to_string()
        };

        div()
            .flex()
            .flex_row()
            .w_full()
            .h(px(HEADER_HEIGHT))
            .bg(theme.mantle)
            .border_b_1()
            .border_color(theme.surface0)
            .items_center()
            .px(px(8.))
            .gap(px(8.))
            .child(
                // Remote cell reference
                div()
                    .flex()
                    .items_center()
                    .justify_center()
                    .w(px(60.))
                    .h(px(24.))
                    .bg(theme.surface0)
                    .rounded(px(4.))
                    .text_size(px(14.))
                    .text_color(theme.subtext1)
                    .child(cell_ref)
            )
            .child(
                div()
                    .flex_1()
                    .h(px(24.))
                    .bg(theme.surface0)
                    .rounded(px(4.))
                    .overflow_hidden()
                    .px(px(8.))
                    .items_center()
                    .text_size(px(14.))
                    .child(content)
            )
    }

    fn render_column_headers(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.global::<Theme>();
        let end_col = (self.scroll_col + self.visible_cols).min(self.cells.col_count());

        div()
            .flex()
            .flex_row()
            .h(px(COLUMN_HEADER_HEIGHT))
            .bg(theme.mantle)
            .border_b_1()
            .border_color(theme.surface0)
            .child(
                div()
                    .w(px(ROW_HEADER_WIDTH))
                    .h_full()
                    .flex_none()
                    .border_r_1()
                    .border_color(theme.surface0)
            )
            .children(
                (self.scroll_col..end_col).map(|col| {
                    let letter = CellPosition::col_to_letter(col);
                    let title = self.header.title(col).unwrap_or_default().to_string();
                    let is_selected = col == self.selected.col;

                    div()
                        .w(px(CELL_WIDTH))
                        .h_full()
                        .flex_none()
                        .flex()
                        .flex_col()
                        .items_center()
                        .justify_center()
                        .border_r_1()
                        .border_color(theme.surface0)
                        .overflow_hidden()
                        .child(
                            div()
                                .text_size(px(10.))
                                .text_color(if is_selected { theme.accent } else { theme.overlay1 })
                                .child(letter)
                        )
                        .child(
                            div()
                                .text_size(px(13.))
                                .text_color(if is_selected { theme.accent } else { theme.subtext0 })
                                .font_weight(FontWeight::BOLD)
                                .child(title)
                        )
                })
            )
    }

    fn render_grid(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.global::<Theme>();
        let end_row = (self.scroll_row + self.visible_rows).min(self.cells.row_count());
        let end_col = (self.scroll_col + self.visible_cols).min(self.cells.col_count());

        div()
            .flex()
            .flex_col()
            .flex_1()
            .overflow_hidden()
            .children(
                (self.scroll_row..end_row).map(|row| {
                    let is_row_selected = row == self.selected.row;
                    let category = self.categories.get(row).copied().unwrap_or_default();
                    let row_bg = theme.row_fill(category).unwrap_or(theme.base);
                    let row_text = theme.row_text(category);

                    div()
                        .flex()
                        .flex_row()
                        .h(px(CELL_HEIGHT))
                        .child(
                            // Remote row number
                            div()
                                .w(px(ROW_HEADER_WIDTH))
                                .h_full()
                                .flex_none()
                                .flex()
                                .items_center()
                                .justify_center()
                                .bg(theme.mantle)
                                .border_r_1()
                                .border_b_1()
                                .border_color(theme.surface0)
                                .text_size(px(12.))
                                .text_color(if is_row_selected { theme.accent } else { theme.subtext0 })
                                .font_weight(if is_row_selected { FontWeight::BOLD } else { FontWeight::NORMAL })
                                .child(format!("{}", CellPosition::new(row, 0).remote_row()))
                        )
                        .children(
                            (self.scroll_col..end_col).map(|col| {
                                let is_selected = row == self.selected.row && col == self.selected.col;
                                let content = self.cells.get(CellPosition::new(row, col)).unwrap_or_default().to_string();

                                if is_selected && self.mode == Mode::Edit {
                                    div()
                                        .id(ElementId::Name(format!("cell-edit-{}-{}", row, col).into()))
                                        .w(px(CELL_WIDTH))
                                        .h(px(CELL_HEIGHT))
                                        .flex_none()
                                        .border_2()
                                        .border_color(theme.accent)
                                        .overflow_hidden()
                                        .child(self.active_input.clone())
                                } else {
                                    div()
                                        .id(ElementId::Name(format!("cell-{}-{}", row, col).into()))
                                        .w(px(CELL_WIDTH))
                                        .h(px(CELL_HEIGHT))
                                        .flex_none()
                                        .flex()
                                        .items_center()
                                        .px(px(4.))
                                        .border_r_1()
                                        .border_b_1()
                                        .border_color(if is_selected { theme.accent } else { theme.surface0 })
                                        .when(is_selected, |d| d.border_2())
                                        .bg(row_bg)
                                        .text_color(row_text)
                                        .text_size(px(14.))
                                        .overflow_hidden()
                                        .on_mouse_down(MouseButton::Left, {
                                            let entity = cx.entity().clone();
                                            move |event, window, app| {
                                                entity.update(app, |this, cx| {
                                                    if event.click_count == 2 {
                                                        this.on_cell_double_click(row, col, window, cx);
                                                    } else {
                                                        this.on_cell_click(row, col, window, cx);
                                                    }
                                                });
                                            }
                                        })
                                        .child(content)
                                }
                            })
                        )
                })
            )
    }

    fn render_footer(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.global::<Theme>();
        let mode_text = match self.mode {
            Mode::Normal => "-- NORMAL --",
            Mode::Edit => "-- EDIT --",
        };
        let failed = self.sync.is_failed();
        let row_status = self
            .categories
            .get(self.selected.row)
            .and_then(Category::marker)
            .unwrap_or_default();

        div()
            .flex()
            .flex_row()
            .w_full()
            .h(px(FOOTER_HEIGHT))
            .bg(theme.mantle)
            .border_t_1()
            .border_color(theme.surface0)
            .items_center()
            .justify_between()
            .px(px(8.))
            .gap(px(8.))
            .text_size(px(12.))
            .text_color(theme.subtext0)
            .child(
                div()
                    .flex_none()
                    .font_weight(FontWeight::BOLD)
                    .child(mode_text)
            )
            .child(
                div()
                    .flex_1()
                    .text_color(theme.overlay1)
                    .child(row_status)
            )
            .child(
                div()
                    .flex()
                    .flex_row()
                    .gap(px(8.))
                    .overflow_hidden()
                    .child(
                        div()
                            .when(failed, |d| d.text_color(theme.error))
                            .child(self.sync.status_text())
                    )
                    .child(self.sync.source.clone())
            )
    }
}

impl Render for SpreadsheetGrid {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let content_bounds = window.viewport_size();
        let grid_height = f32::from(content_bounds.height) - HEADER_HEIGHT - COLUMN_HEADER_HEIGHT - FOOTER_HEIGHT;
        let grid_width = f32::from(content_bounds.width) - ROW_HEADER_WIDTH;

        self.visible_rows = ((grid_height / CELL_HEIGHT).ceil() as usize).max(1);
        self.visible_cols = ((grid_width / CELL_WIDTH).ceil() as usize).max(1);
        self.ensure_visible();

        let key_context = if self.mode == Mode::Edit {
            "EditMode"
        } else {
            "NormalMode"
        };

        div()
            .flex()
            .flex_col()
            .size_full()
            .key_context(key_context)
            .track_focus(&self.focus_handle)
            // Normal mode actions
            .on_action(cx.listener(Self::move_up))
            .on_action(cx.listener(Self::move_down))
            .on_action(cx.listener(Self::move_left))
            .on_action(cx.listener(Self::move_right))
            .on_action(cx.listener(Self::enter_edit_mode))
            // Edit mode actions
            .on_action(cx.listener(Self::exit_edit_mode))
            .on_action(cx.listener(Self::cancel_edit))
            .on_action(cx.listener(Self::exit_and_move_down))
            .on_action(cx.listener(Self::exit_and_move_right))
            .child(self.render_header(cx))
            .child(self.render_column_headers(cx))
            .child(self.render_grid(cx))
            .child(self.render_footer(cx))
    }
}

impl Focusable for SpreadsheetGrid {
    fn focus_handle(&self, _: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}
