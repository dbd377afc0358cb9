use std::ops::Range;

use tracing::trace;
use tvgrid::domain::Message;
use tvgrid::{GridColumn, Table};

use crate::ui::{BORDER_HEIGHT, TABLE_HEADER_HEIGHT};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

/// State of the preview: the loaded table, its resolved columns and the
/// scroll position.
pub struct Model {
    table: Table,
    columns: Vec<GridColumn>,
    pub status: Status,
    offset_row: usize,
    offset_column: usize, // Among the unpinned columns
    heigh: usize,         // Rows that fit on screen
}

impl Model {
    pub fn new(table: Table, columns: Vec<GridColumn>) -> Self {
        Self {
            table,
            columns,
            status: Status::READY,
            offset_row: 0,
            offset_column: 0,
            heigh: 0,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Pinned columns first, followed by the unpinned columns from the
    /// current horizontal offset.
    pub fn visible_columns(&self) -> Vec<&GridColumn> {
        let pinned = self.columns.iter().filter(|c| c.props.is_pinned);
        let scrolled = self
            .columns
            .iter()
            .filter(|c| !c.props.is_pinned)
            .skip(self.offset_column);
        pinned.chain(scrolled).collect()
    }

    pub fn visible_rows(&self) -> Range<usize> {
        let end = std::cmp::min(self.offset_row + self.heigh, self.table.height());
        self.offset_row..end
    }

    fn unpinned_columns(&self) -> usize {
        self.columns.iter().filter(|c| !c.props.is_pinned).count()
    }

    pub fn update(&mut self, message: Message) {
        match message {
            Message::Quit => self.status = Status::QUITTING,
            Message::Resize(_, height) => {
                self.heigh = (height as usize).saturating_sub(BORDER_HEIGHT + TABLE_HEADER_HEIGHT);
                trace!("UI was resized, {} rows fit", self.heigh);
            }
            Message::MoveDown => self.scroll_rows(1),
            Message::MoveUp => self.scroll_rows(-1),
            Message::MovePageDown => self.scroll_rows(self.heigh.max(1) as isize),
            Message::MovePageUp => self.scroll_rows(-(self.heigh.max(1) as isize)),
            Message::MoveRight => {
                if self.offset_column + 1 < self.unpinned_columns() {
                    self.offset_column += 1;
                }
            }
            Message::MoveLeft => self.offset_column = self.offset_column.saturating_sub(1),
        }
    }

    fn scroll_rows(&mut self, delta: isize) {
        let last = self.table.height().saturating_sub(self.heigh.max(1));
        self.offset_row = self.offset_row.saturating_add_signed(delta).min(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;
    use tvgrid::{GridPolicy, load_columns};

    fn model() -> Model {
        let frame = df!(
            "a" => (0..50i64).collect::<Vec<i64>>(),
            "b" => (0..50i64).collect::<Vec<i64>>(),
            "c" => (0..50i64).collect::<Vec<i64>>()
        )
        .unwrap();
        let table = Table::from_frame(frame).unwrap();
        let columns = load_columns(&table, None, &GridPolicy::default());
        let mut model = Model::new(table, columns);
        model.update(Message::Resize(80, 13));
        model
    }

    fn names(model: &Model) -> Vec<String> {
        model
            .visible_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    #[test]
    fn pinned_index_stays_visible() {
        let mut model = model();
        assert_eq!(names(&model), vec!["", "a", "b", "c"]);
        model.update(Message::MoveRight);
        model.update(Message::MoveRight);
        assert_eq!(names(&model), vec!["", "c"]);
        model.update(Message::MoveRight);
        assert_eq!(names(&model), vec!["", "c"]);
        model.update(Message::MoveLeft);
        assert_eq!(names(&model), vec!["", "b", "c"]);
    }

    #[test]
    fn row_scrolling_is_clamped() {
        let mut model = model();
        assert_eq!(model.visible_rows(), 0..10);
        model.update(Message::MoveUp);
        assert_eq!(model.visible_rows(), 0..10);
        model.update(Message::MovePageDown);
        assert_eq!(model.visible_rows(), 10..20);
        for _ in 0..10 {
            model.update(Message::MovePageDown);
        }
        assert_eq!(model.visible_rows(), 40..50);
    }

    #[test]
    fn quit() {
        let mut model = model();
        model.update(Message::Quit);
        assert_eq!(model.status, Status::QUITTING);
    }
}
