//! The table grid and its pagination footer.

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::JsonRow;
use crate::table::{Column, DataTable, PinSide};

/// Render the current page of the table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some(table) = app.table.as_ref() else {
        let msg = if app.last_updated.is_some() {
            app.empty_message()
        } else {
            "Loading..."
        };
        render_message(frame, block.title(" Rows "), msg, app, area);
        return;
    };

    let page = table.page();
    let block = block.title(title(table));

    if table.shows_empty_state() {
        render_message(frame, block, table.empty_message(), app, area);
        return;
    }

    let columns = table.visible_columns();
    let marks = table.features().enable_selection;

    let mut header_cells = Vec::with_capacity(columns.len() + 1);
    if marks {
        header_cells.push(Cell::from(" "));
    }
    for (i, column) in columns.iter().enumerate() {
        header_cells.push(header_cell(table, column, i == app.selected_column, app));
    }
    let header = Row::new(header_cells).height(1).style(app.theme.header);

    let rows: Vec<Row> = page
        .rows
        .iter()
        .map(|&index| {
            let record = &table.rows()[index];
            let mut cells = Vec::with_capacity(columns.len() + 1);
            if marks {
                let mark = if table.is_selected(index) { "●" } else { " " };
                cells.push(Cell::from(mark).style(Style::default().fg(app.theme.marked)));
            }
            cells.extend(columns.iter().map(|c| Cell::from(c.display(record))));
            Row::new(cells)
        })
        .collect();

    let mut widths = Vec::with_capacity(columns.len() + 1);
    if marks {
        widths.push(Constraint::Length(1));
    }
    widths.extend(columns.iter().map(|c| Constraint::Fill(c.width)));

    let grid = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_row.min(page.rows.len().saturating_sub(1))));
    frame.render_stateful_widget(grid, area, &mut state);
}

fn title(table: &DataTable<JsonRow>) -> String {
    let page = table.page();
    if page.rows.is_empty() {
        return format!(" Rows (0 of {}) ", table.rows().len());
    }
    let first = (page.page - 1) * table.view().page_size + 1;
    let first = if table.features().enable_pagination { first } else { 1 };
    let last = first + page.rows.len() - 1;
    format!(" Rows {}-{} of {} ", first, last, page.total_count)
}

fn header_cell<'a>(
    table: &DataTable<JsonRow>,
    column: &Column<JsonRow>,
    under_cursor: bool,
    app: &App,
) -> Cell<'a> {
    let mut text = column.header.clone();
    if let Some(direction) = table.view().sort_direction(&column.key) {
        text.push_str(direction.arrow());
    }
    let mut style = match table.view().pinned.get(&column.key) {
        Some(PinSide::Left) => {
            text.insert(0, '⇤');
            app.theme.pinned_header
        }
        Some(PinSide::Right) => {
            text.push('⇥');
            app.theme.pinned_header
        }
        None => app.theme.header,
    };
    if under_cursor {
        style = style.patch(app.theme.selected_column);
    }
    Cell::from(text).style(style)
}

fn render_message(frame: &mut Frame, block: Block, msg: &str, app: &App, area: Rect) {
    let inner_height = area.height.saturating_sub(2);
    let mut lines = vec![Line::from(""); (inner_height / 2) as usize];
    lines.push(Line::from(Span::styled(msg.to_string(), app.theme.muted)));
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(block);
    frame.render_widget(paragraph, area);
}

/// Render the page indicator and navigation hints.
pub fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    let Some(table) = app.table.as_ref() else {
        return;
    };
    let page = table.page();

    let line = if table.features().enable_pagination {
        let enabled = Style::default().fg(app.theme.highlight);
        let prev = if page.has_prev() { enabled } else { app.theme.muted };
        let next = if page.has_next() { enabled } else { app.theme.muted };
        Line::from(vec![
            Span::styled(" ‹ p ", prev),
            Span::styled(
                format!("Page {} of {}", page.page, page.page_count),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(" n › ", next),
            Span::styled(format!(" {} per page (+/-)", table.view().page_size), app.theme.muted),
        ])
    } else {
        Line::from(Span::styled(format!(" {} rows", page.total_count), app.theme.muted))
    };

    frame.render_widget(Paragraph::new(line), area);
}
