use crate::table::Grid;

pub const FINISHED_MARKER: &str = "Finished";
pub const IN_PROGRESS_MARKER: &str = "In Progress";
pub const NOT_FINISHED_MARKER: &str = "Not Finished";

/// Display category of a row, derived from the status markers in its cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Category {
    Finished,
    InProgress,
    NotFinished,
    /// No marker present. Rendered with the default background.
    #[default]
    None,
}

impl Category {
    /// Background fill as 0xRRGGBB, or `None` to leave the row unstyled.
    pub fn fill(&self) -> Option<u32> {
        match self {
            Category::Finished => Some(0x90ee90),
            Category::InProgress => Some(0xffffe0),
            Category::NotFinished => Some(0xffffff),
            Category::None => None,
        }
    }

    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Category::Finished => Some(FINISHED_MARKER),
            Category::InProgress => Some(IN_PROGRESS_MARKER),
            Category::NotFinished => Some(NOT_FINISHED_MARKER),
            Category::None => None,
        }
    }
}

/// Classify one row. Markers must match a whole cell exactly; when several
/// are present, Finished beats In Progress beats Not Finished.
pub fn classify<S: AsRef<str>>(row: &[S]) -> Category {
    let mut finished = false;
    let mut in_progress = false;
    let mut not_finished = false;

    for value in row {
        match value.as_ref() {
            FINISHED_MARKER => finished = true,
            IN_PROGRESS_MARKER => in_progress = true,
            NOT_FINISHED_MARKER => not_finished = true,
            _ => {}
        }
    }

    if finished {
        Category::Finished
    } else if in_progress {
        Category::InProgress
    } else if not_finished {
        Category::NotFinished
    } else {
        Category::None
    }
}

pub fn classify_rows(grid: &Grid) -> Vec<Category> {
    grid.rows().map(classify).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CellPosition;

    #[test]
    fn finished_wins_over_in_progress() {
        assert_eq!(classify(&["Finished", "In Progress"]), Category::Finished);
        assert_eq!(classify(&["In Progress", "Finished"]), Category::Finished);
    }

    #[test]
    fn in_progress_wins_over_not_finished() {
        assert_eq!(classify(&["In Progress", "Not Finished"]), Category::InProgress);
        assert_eq!(classify(&["Not Finished", "x", "In Progress"]), Category::InProgress);
    }

    #[test]
    fn not_finished_is_distinct_from_none() {
        let not_finished = classify(&["Not Finished"]);
        let none = classify::<&str>(&[]);
        assert_eq!(not_finished, Category::NotFinished);
        assert_eq!(none, Category::None);
        assert_ne!(not_finished.fill(), none.fill());
        assert_eq!(none.fill(), None);
    }

    #[test]
    fn markers_require_exact_match() {
        assert_eq!(classify(&["finished", " Finished", "In progress"]), Category::None);
        assert_eq!(classify(&["Not Finished yet"]), Category::None);
    }

    #[test]
    fn rows_are_classified_independently() {
        let mut grid = Grid::empty(3, 2);
        grid.set(CellPosition::new(0, 1), "Finished".into());
        grid.set(CellPosition::new(2, 0), "In Progress".into());
        assert_eq!(
            classify_rows(&grid),
            vec![Category::Finished, Category::None, Category::InProgress]
        );
    }
}
