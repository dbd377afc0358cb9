use ratatui::{
    Frame,
    style::{Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Block, Cell, Row, Table},
};
use tvgrid::GridColumn;
use tvgrid::domain::EDITABLE_ICON;

use crate::model::Model;

pub const BORDER_HEIGHT: usize = 2;
pub const TABLE_HEADER_HEIGHT: usize = 1;
const COLUMN_SPACING: u16 = 1;
const EDITABLE_MARKER: &str = " ✎";

#[derive(Debug, Default)]
pub struct TableUI {}

impl TableUI {
    pub fn new() -> Self {
        Self {}
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let columns = model.visible_columns();

        let title = Line::from(format!(" {} ", model.table().name()).bold());
        let instructions = Line::from(vec![
            " Scroll ".into(),
            "<Arrows>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let header = Row::new(columns.iter().map(|c| Self::header_cell(c)))
            .style(Style::new().bold())
            .height(TABLE_HEADER_HEIGHT as u16);

        let rows = model.visible_rows().map(|row| {
            Row::new(
                columns
                    .iter()
                    .map(|c| c.render(&model.table().value(&c.props, row))),
            )
        });
        let widths = columns.iter().map(|c| c.constraint());

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .block(block);
        frame.render_widget(table, frame.area());
    }

    fn header_cell(column: &GridColumn) -> Cell<'static> {
        let mut title = column.title().to_string();
        if column.props.icon.as_deref() == Some(EDITABLE_ICON) {
            title.push_str(EDITABLE_MARKER);
        }
        let line = Line::from(title).alignment(column.alignment().into());
        if column.props.is_index {
            Cell::from(line.italic())
        } else {
            Cell::from(line)
        }
    }
}
