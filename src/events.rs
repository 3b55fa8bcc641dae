use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::table::PinSide;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.show_detail_overlay {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.close_overlay();
            }
            _ => {}
        }
        return;
    }

    if app.show_column_menu {
        handle_column_menu(app, key);
        return;
    }

    if app.search_active {
        handle_search_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // Rows on the current page
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_first(),
        KeyCode::PageDown => app.select_last(),

        // Columns
        KeyCode::Left | KeyCode::Char('h') => app.select_column_left(),
        KeyCode::Right | KeyCode::Char('l') => app.select_column_right(),

        // Pages
        KeyCode::Char('n') => app.next_page(),
        KeyCode::Char('p') => app.prev_page(),
        KeyCode::Home => app.first_page(),
        KeyCode::End => app.last_page(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.change_page_size(true),
        KeyCode::Char('-') => app.change_page_size(false),

        // Sort, search, filter
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('f') => app.filter_by_selected_cell(),
        KeyCode::Char('F') => app.clear_filters(),

        KeyCode::Char('v') => app.open_column_menu(),

        // Row actions
        KeyCode::Char(' ') => app.toggle_mark(),
        KeyCode::Char('a') => app.mark_page(),
        KeyCode::Char('A') => app.clear_marks(),
        KeyCode::Enter => app.view_selected(),
        KeyCode::Char('d') => app.delete_selected(),
        KeyCode::Char('D') => app.delete_marked(),

        KeyCode::Char('e') => app.export(),
        KeyCode::Char('r') => app.refresh(),

        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        _ => {}
    }
}

fn handle_column_menu(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('v') | KeyCode::Char('q') => app.close_column_menu(),
        KeyCode::Up | KeyCode::Char('k') => app.menu_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu_next(),
        KeyCode::Char(' ') | KeyCode::Enter => app.menu_toggle_visibility(),
        KeyCode::Char('<') => app.menu_pin(Some(PinSide::Left)),
        KeyCode::Char('>') => app.menu_pin(Some(PinSide::Right)),
        KeyCode::Char('0') => app.menu_pin(None),
        KeyCode::Char('[') => app.menu_move(-1),
        KeyCode::Char(']') => app.menu_move(1),
        _ => {}
    }
}

/// Handle key input while search is active
fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Apply now instead of waiting out the debounce
        KeyCode::Enter => app.apply_search(),

        // Leave input mode; the typed term still applies
        KeyCode::Esc => app.cancel_search(),

        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.clear_search(),

        KeyCode::Backspace => app.search_pop(Instant::now()),

        KeyCode::Char(c) => app.search_push(c, Instant::now()),

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.show_column_menu {
        match mouse.kind {
            MouseEventKind::ScrollUp => app.menu_prev(),
            MouseEventKind::ScrollDown => app.menu_next(),
            _ => {}
        }
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),
        _ => {}
    }
}
