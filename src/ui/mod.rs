//! Terminal rendering.
//!
//! The frame is a header line, the table grid with its pagination footer,
//! and a status bar. The column menu, row detail, and help are overlays.

pub mod columns;
pub mod common;
pub mod detail;
pub mod grid;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

/// Smallest usable terminal size.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 12;

/// Draw one frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.danger));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Min(6),    // Grid
        Constraint::Length(1), // Pagination
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    grid::render(frame, app, chunks[1]);
    grid::render_pagination(frame, app, chunks[2]);
    common::render_status_bar(frame, app, chunks[3]);

    if app.show_column_menu {
        columns::render_overlay(frame, app, area);
    }
    if app.show_detail_overlay {
        detail::render_overlay(frame, app, area);
    }
    if app.show_help {
        common::render_help(frame, app, area);
    }
}

/// A rectangle of at most `width` x `height`, centered in `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{rows_from_value, ChannelSource};
    use crate::table::{Permissions, TableOptions};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn app(rows: serde_json::Value) -> App {
        let (tx, source) = ChannelSource::create("test");
        let options = TableOptions {
            permissions: Permissions::all(),
            page_size: 2,
            ..Default::default()
        };
        let mut app = App::new(Box::new(source), options);
        tx.send(rows_from_value(rows).unwrap()).unwrap();
        app.reload_data();
        app
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draws_headers_and_first_page() {
        let app = app(json!([
            {"name": "Laptop", "status": "Active"},
            {"name": "Forklift", "status": "Retired"},
            {"name": "Printer", "status": "Active"}
        ]));
        let screen = render(&app, 80, 20);
        assert!(screen.contains("Name"));
        assert!(screen.contains("Status"));
        assert!(screen.contains("Laptop"));
        assert!(screen.contains("Forklift"));
        assert!(!screen.contains("Printer"));
        assert!(screen.contains("Page 1 of 2"));
    }

    #[test]
    fn test_draws_empty_message() {
        let mut app = app(json!([{"name": "Laptop"}]));
        app.search_push('z', std::time::Instant::now());
        app.apply_search();
        let screen = render(&app, 80, 20);
        assert!(screen.contains("No records found"));
    }

    #[test]
    fn test_too_small_terminal() {
        let app = app(json!([{"name": "Laptop"}]));
        let screen = render(&app, 40, 10);
        assert!(screen.contains("Terminal too small"));
    }

    #[test]
    fn test_column_menu_overlay() {
        let mut app = app(json!([{"name": "Laptop", "status": "Active"}]));
        app.open_column_menu();
        let screen = render(&app, 80, 20);
        assert!(screen.contains("Columns"));
        assert!(screen.contains("[x] Name"));
    }

    #[test]
    fn test_centered_fits_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered(area, 100, 100);
        assert!(rect.width <= 16 && rect.height <= 8);
        assert_eq!(rect.x, 2);
    }
}
