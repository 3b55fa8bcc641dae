//! Common UI components: header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::table::{HeaderActionKind, RowActionKind};

/// Render the header bar: source, row counts, search, filters, and sort.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" ASSET TABLE ", Style::default().add_modifier(Modifier::BOLD));

    let Some(table) = app.table.as_ref() else {
        let line = Line::from(vec![
            title,
            Span::raw(format!("│ {} │ Loading...", app.source_description())),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let mut spans = vec![
        title,
        Span::raw(format!("│ {} │ ", app.source_description())),
        Span::styled(
            table.page().total_count.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" of {} rows", table.rows().len())),
    ];

    if app.search_active {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("/{}_", app.search_text),
            Style::default().fg(app.theme.highlight),
        ));
    } else if !table.view().search_term.is_empty() {
        spans.push(Span::raw(format!(" │ /{}/", table.view().search_term)));
    }

    for (key, filter) in &table.view().filters {
        let header = table.model().get(key).map_or(key.as_str(), |c| c.header.as_str());
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{} {}", header, filter.describe()),
            Style::default().fg(app.theme.marked),
        ));
    }

    if let Some(sort) = &table.view().sort {
        let header = table.model().get(&sort.column).map_or(sort.column.as_str(), |c| c.header.as_str());
        spans.push(Span::raw(format!(" │ sort: {}{}", header, sort.direction.arrow())));
    }

    if !table.selection().is_empty() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{} selected", table.selection().len()),
            Style::default().fg(app.theme.marked),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Key bound to a row action.
fn row_action_key(kind: RowActionKind) -> &'static str {
    match kind {
        RowActionKind::View => "Enter",
        RowActionKind::Delete => "d",
        RowActionKind::Edit | RowActionKind::Custom(_) => "",
    }
}

/// Render the status bar: a temporary message, an error, or the controls
/// available for the current permissions.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(err) = &app.load_error {
        let paragraph = Paragraph::new(format!(" Error: {} | r:retry q:quit", err))
            .style(Style::default().fg(app.theme.danger));
        frame.render_widget(paragraph, area);
        return;
    }

    let Some(table) = app.table.as_ref() else {
        frame.render_widget(Paragraph::new(" Loading... | q:quit").style(app.theme.muted), area);
        return;
    };

    if app.search_active {
        let hint = " Type to search | Enter:apply Esc:close Ctrl-U:clear";
        frame.render_widget(Paragraph::new(hint).style(app.theme.muted), area);
        return;
    }

    let mut spans = Vec::new();
    if let Some(updated) = app.last_updated {
        spans.push(Span::styled(
            format!(" Updated {:.1}s ago │", updated.elapsed().as_secs_f64()),
            app.theme.muted,
        ));
    }
    if table.is_loading() {
        spans.push(Span::styled(" Refreshing… │", app.theme.muted));
    }

    for action in table.row_actions() {
        let key = row_action_key(action.kind);
        if key.is_empty() {
            continue;
        }
        spans.push(Span::raw(format!(" {}:", key)));
        spans.push(Span::styled(
            action.label.label.clone(),
            app.theme.action_style(action.label.variant),
        ));
    }
    for action in table.header_actions() {
        if action.kind == HeaderActionKind::Export {
            spans.push(Span::raw(" e:"));
            spans.push(Span::styled(
                action.label.label.clone(),
                app.theme.action_style(action.label.variant),
            ));
        }
    }

    spans.push(Span::styled(
        " /:search s:sort f:filter v:columns n/p:page ?:help q:quit",
        app.theme.muted,
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the help overlay with keyboard shortcuts.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ↑/↓ j/k     Move between rows"),
        Line::from("  ←/→ h/l     Move between columns"),
        Line::from("  n/p         Next/previous page"),
        Line::from("  Home/End    First/last page"),
        Line::from("  +/-         Page size"),
        Line::from(""),
        section(" Table"),
        Line::from("  /           Search"),
        Line::from("  s           Cycle sort on column"),
        Line::from("  f           Filter column by cell"),
        Line::from("  F           Clear filters"),
        Line::from("  v           Column menu"),
        Line::from(""),
        section(" Rows"),
        Line::from("  Enter       View row"),
        Line::from("  Space       Select row"),
        Line::from("  a/A         Select page/clear selection"),
        Line::from("  d           Delete row"),
        Line::from("  D           Delete selected rows"),
        Line::from("  e           Export visible rows"),
        Line::from("  r           Refresh"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled("Press any key to close", app.theme.muted)]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let help_area = super::centered(area, 44, 31);
    frame.render_widget(Clear, help_area);
    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}
