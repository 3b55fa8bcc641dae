//! Column menu overlay: visibility, pinning, and order.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::table::PinSide;

pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let Some(table) = app.table.as_ref() else {
        return;
    };
    let columns = table.ordered_columns();
    let view = table.view();

    let items: Vec<ListItem> = columns
        .iter()
        .map(|column| {
            let check = if view.visible_columns.contains(&column.key) { "[x]" } else { "[ ]" };
            let mut spans = vec![
                Span::raw(format!("{} ", check)),
                Span::styled(column.header.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", column.key), app.theme.muted),
            ];
            if let Some(side) = view.pinned.get(&column.key) {
                let arrow = match side {
                    PinSide::Left => "⇤",
                    PinSide::Right => "⇥",
                };
                spans.push(Span::styled(
                    format!("  {} pinned {}", arrow, side.label()),
                    app.theme.pinned_header,
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let height = (columns.len() as u16).saturating_add(5);
    let overlay = super::centered(area, 60, height);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .title(" Columns ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).split(inner);

    let list = List::new(items)
        .highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");
    let mut state = ListState::default();
    state.select(Some(app.menu_index));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let pin_hint = if table.can_pin() {
        "<:pin left >:pin right 0:unpin"
    } else {
        "pinning disabled"
    };
    let hints = vec![
        Line::from(Span::styled(format!(" Space:show/hide [/]:move {}", pin_hint), app.theme.muted)),
        Line::from(Span::styled(" Esc:close", app.theme.muted)),
    ];
    frame.render_widget(Paragraph::new(hints), chunks[1]);
}
