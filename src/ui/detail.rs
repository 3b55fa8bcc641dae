//! Row detail overlay.
//!
//! Lists every column of the viewed row (hidden ones included), followed by
//! any fields of the record no column reads.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::data::{CellValue, RowId};

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 10;

pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }
    let (Some(table), Some(record)) = (app.table.as_ref(), app.detail_row.as_ref()) else {
        return;
    };

    let overlay_width = (area.width * 90 / 100).clamp(MIN_OVERLAY_WIDTH, 100);
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 40);
    let overlay = super::centered(area, overlay_width, overlay_height);
    frame.render_widget(Clear, overlay);

    let chunks = Layout::vertical([Constraint::Min(4), Constraint::Length(1)]).split(overlay);

    let mut rows: Vec<Row> = table
        .ordered_columns()
        .iter()
        .map(|column| {
            let label_style = if table.view().visible_columns.contains(&column.key) {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                app.theme.muted
            };
            Row::new(vec![
                Cell::from(column.header.clone()).style(label_style),
                Cell::from(column.display(record)),
            ])
        })
        .collect();

    let extra: Vec<Row> = record
        .iter()
        .filter(|(key, _)| !table.model().contains(key))
        .map(|(key, value)| {
            Row::new(vec![
                Cell::from(key.clone()).style(app.theme.muted),
                Cell::from(CellValue::from_json(value).to_string()),
            ])
        })
        .collect();
    if !extra.is_empty() {
        rows.push(Row::new(vec![Cell::from(""), Cell::from("")]));
        rows.extend(extra);
    }

    let id = table
        .rows()
        .iter()
        .position(|r| r == record)
        .and_then(|index| table.row_id(index))
        .map_or_else(|| "removed".to_string(), |id: RowId| id.to_string());

    let grid = Table::new(rows, [Constraint::Percentage(35), Constraint::Percentage(65)]).block(
        Block::default()
            .title(format!(" Row {} ", id))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.highlight)),
    );
    frame.render_widget(grid, chunks[0]);

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " Press Esc to close ",
        app.theme.muted,
    )]));
    frame.render_widget(footer, chunks[1]);
}
