//! Application state and interaction logic for the terminal viewer.
//!
//! [`App`] owns one [`DataTable`] over JSON rows and the [`RowSource`] that
//! feeds it. Table actions do not act on the app directly: their callbacks
//! push a [`TableCommand`] onto a channel that [`App::tick`] drains, which
//! keeps the engine unaware of the viewer.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::data::JsonRow;
use crate::error::TableError;
use crate::source::{RowSet, RowSource};
use crate::table::{
    infer_columns, ActionLabel, ActionVariant, BulkAction, Column, ColumnDef, DataTable,
    ExportFormat, Filter, HeaderAction, HeaderActionKind, Permission, PinSide, RowAction,
    RowActionKind, TableOptions, ViewStore,
};
use crate::ui::Theme;

/// Where the `e` key writes its export.
pub const DEFAULT_EXPORT_PATH: &str = "asset-table-export.csv";

/// Page sizes offered by `+` and `-`.
pub const PAGE_SIZES: [usize; 6] = [5, 10, 20, 25, 50, 100];

const STATUS_TTL: Duration = Duration::from_secs(3);

/// Requests raised by table action callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum TableCommand {
    View(JsonRow),
    Delete(JsonRow),
    DeleteMany(Vec<JsonRow>),
    Export,
    Refresh,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_detail_overlay: bool,
    pub show_column_menu: bool,
    pub search_active: bool,

    // Data
    source: Box<dyn RowSource>,
    pub table: Option<DataTable<JsonRow>>,
    options: TableOptions,
    column_defs: Option<Vec<ColumnDef>>,
    store: Option<Box<dyn ViewStore>>,
    pub load_error: Option<String>,
    pub last_updated: Option<Instant>,

    // Action plumbing
    commands: mpsc::UnboundedReceiver<TableCommand>,
    command_tx: mpsc::UnboundedSender<TableCommand>,

    // Navigation
    /// Position of the cursor on the current page.
    pub selected_row: usize,
    /// Index into the visible columns.
    pub selected_column: usize,
    /// Cursor in the column menu, over all columns in order.
    pub menu_index: usize,

    pub search_text: String,
    pub detail_row: Option<JsonRow>,
    pub export_path: PathBuf,

    // UI
    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(source: Box<dyn RowSource>, options: TableOptions) -> Self {
        let (command_tx, commands) = mpsc::unbounded_channel();
        Self {
            running: true,
            show_help: false,
            show_detail_overlay: false,
            show_column_menu: false,
            search_active: false,
            source,
            table: None,
            options,
            column_defs: None,
            store: None,
            load_error: None,
            last_updated: None,
            commands,
            command_tx,
            selected_row: 0,
            selected_column: 0,
            menu_index: 0,
            search_text: String::new(),
            detail_row: None,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Use explicit column definitions instead of inferring them from the
    /// first row.
    pub fn with_columns(mut self, defs: Vec<ColumnDef>) -> Self {
        self.column_defs = Some(defs);
        self
    }

    /// Store used to persist the table layout under the options' storage key.
    pub fn with_store(mut self, store: Box<dyn ViewStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_export_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.export_path = path.as_ref().to_path_buf();
        self
    }

    /// Message shown when there are no rows to display.
    pub fn empty_message(&self) -> &str {
        match &self.table {
            Some(table) => table.empty_message(),
            None => &self.options.empty_message,
        }
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// The status message, if it has not expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, at)) if at.elapsed() < STATUS_TTL => Some(msg),
            _ => None,
        }
    }

    // ---- data ----------------------------------------------------------------

    /// Poll the source. Returns true if a new row set was applied.
    pub fn reload_data(&mut self) -> bool {
        if let Some(rows) = self.source.poll() {
            self.apply_rows(rows);
            return true;
        }

        if let Some(err) = self.source.error() {
            self.load_error = Some(err.to_string());
            if let Some(table) = self.table.as_mut() {
                table.set_loading(false);
            }
        }
        false
    }

    fn apply_rows(&mut self, rows: RowSet) {
        self.last_updated = Some(Instant::now());
        self.load_error = None;

        match self.table.as_mut() {
            Some(table) => {
                table.set_rows(rows);
                table.set_loading(false);
            }
            None => match self.build_table(rows) {
                Ok(Some(table)) => self.table = Some(table),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "cannot build table");
                    self.load_error = Some(e.to_string());
                }
            },
        }
        self.clamp_selection();
    }

    /// Build the table for the first row set. With no column definitions and
    /// no rows to infer from, there is nothing to build yet.
    fn build_table(&mut self, rows: RowSet) -> Result<Option<DataTable<JsonRow>>, TableError> {
        let defs = match &self.column_defs {
            Some(defs) => defs.clone(),
            None => rows.first().map(infer_columns).unwrap_or_default(),
        };
        if defs.is_empty() {
            return Ok(None);
        }

        let columns: Vec<Column<JsonRow>> = defs.into_iter().map(ColumnDef::into_column).collect();
        let mut table = DataTable::new(columns, rows, self.options.clone())?;
        if let Some(store) = self.store.take() {
            table = table.with_store(store);
        }
        tracing::info!(
            columns = table.model().len(),
            rows = table.rows().len(),
            "table ready"
        );
        Ok(Some(self.register_actions(table)))
    }

    fn register_actions(&self, table: DataTable<JsonRow>) -> DataTable<JsonRow> {
        let view_tx = self.command_tx.clone();
        let delete_tx = self.command_tx.clone();
        let bulk_tx = self.command_tx.clone();
        let export_tx = self.command_tx.clone();
        let refresh_tx = self.command_tx.clone();

        table
            .with_row_action(RowAction::new(
                ActionLabel::new("view", "View").variant(ActionVariant::Primary),
                RowActionKind::View,
                move |row: &JsonRow| {
                    let _ = view_tx.send(TableCommand::View(row.clone()));
                },
            ))
            .with_row_action(RowAction::new(
                ActionLabel::new("delete", "Delete").variant(ActionVariant::Danger),
                RowActionKind::Delete,
                move |row: &JsonRow| {
                    let _ = delete_tx.send(TableCommand::Delete(row.clone()));
                },
            ))
            .with_bulk_action(BulkAction::new(
                ActionLabel::new("delete-selected", "Delete selected").variant(ActionVariant::Danger),
                Some(Permission::Delete),
                move |rows: &[&JsonRow]| {
                    let rows = rows.iter().map(|r| (*r).clone()).collect();
                    let _ = bulk_tx.send(TableCommand::DeleteMany(rows));
                },
            ))
            .with_header_action(HeaderAction::new(
                ActionLabel::new("export", "Export"),
                HeaderActionKind::Export,
                move || {
                    let _ = export_tx.send(TableCommand::Export);
                },
            ))
            .on_refresh(move || {
                let _ = refresh_tx.send(TableCommand::Refresh);
            })
    }

    /// Apply a due search and run queued action commands.
    pub fn tick(&mut self, now: Instant) {
        if let Some(table) = self.table.as_mut() {
            if table.tick(now) {
                self.selected_row = 0;
            }
        }
        while let Ok(command) = self.commands.try_recv() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: TableCommand) {
        tracing::debug!(?command, "handling table command");
        match command {
            TableCommand::View(row) => {
                self.detail_row = Some(row);
                self.show_detail_overlay = true;
            }
            TableCommand::Delete(row) => {
                if let Some(index) = self.locate_row(&row) {
                    self.remove_rows(&BTreeSet::from([index]));
                }
            }
            TableCommand::DeleteMany(_) => {
                let marked: BTreeSet<usize> = self.table.as_ref().map_or_else(BTreeSet::new, |t| {
                    (0..t.rows().len()).filter(|&i| t.is_selected(i)).collect()
                });
                self.remove_rows(&marked);
            }
            TableCommand::Export => {
                let path = self.export_path.clone();
                match self.export_to(&path) {
                    Ok(()) => self.set_status_message(format!("Exported to {}", path.display())),
                    Err(e) => self.set_status_message(format!("Export failed: {}", e)),
                }
            }
            TableCommand::Refresh => self.request_refresh(),
        }
    }

    /// Ask the source for a fresh row set and mark the table loading until
    /// it arrives.
    pub fn request_refresh(&mut self) {
        if self.source.invalidate() {
            if let Some(table) = self.table.as_mut() {
                table.set_loading(true);
            }
        }
        self.reload_data();
    }

    /// Position of `row` in the row set, preferring the row under the cursor
    /// when identical rows exist.
    fn locate_row(&self, row: &JsonRow) -> Option<usize> {
        let table = self.table.as_ref()?;
        match self.selected_row_index() {
            Some(index) if table.rows().get(index) == Some(row) => Some(index),
            _ => table.rows().iter().position(|r| r == row),
        }
    }

    /// Drop rows at the given positions from the in-memory row set. The
    /// source is not modified.
    fn remove_rows(&mut self, doomed: &BTreeSet<usize>) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        let kept: RowSet = table
            .rows()
            .iter()
            .enumerate()
            .filter(|(i, _)| !doomed.contains(i))
            .map(|(_, r)| r.clone())
            .collect();
        let removed = table.rows().len() - kept.len();
        table.set_rows(kept);
        self.clamp_selection();
        self.set_status_message(format!("Removed {} row(s) from the view", removed));
    }

    /// Write the visible rows to `path`. The format follows the extension and
    /// defaults to CSV.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        let Some(table) = self.table.as_ref() else {
            anyhow::bail!("No data to export");
        };
        let format = ExportFormat::from_path(path).unwrap_or(ExportFormat::Csv);
        let text = table.export(format)?;
        fs::write(path, text)?;
        Ok(())
    }

    // ---- selection -----------------------------------------------------------

    fn page_len(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.page().rows.len())
    }

    fn visible_column_count(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.visible_columns().len())
    }

    fn clamp_selection(&mut self) {
        self.selected_row = self.selected_row.min(self.page_len().saturating_sub(1));
        self.selected_column = self.selected_column.min(self.visible_column_count().saturating_sub(1));
        let total = self.table.as_ref().map_or(0, |t| t.model().len());
        self.menu_index = self.menu_index.min(total.saturating_sub(1));
    }

    pub fn select_next(&mut self) {
        self.selected_row = (self.selected_row + 1).min(self.page_len().saturating_sub(1));
    }

    pub fn select_prev(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected_row = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_row = self.page_len().saturating_sub(1);
    }

    pub fn select_column_left(&mut self) {
        self.selected_column = self.selected_column.saturating_sub(1);
    }

    pub fn select_column_right(&mut self) {
        self.selected_column =
            (self.selected_column + 1).min(self.visible_column_count().saturating_sub(1));
    }

    /// Row-set index of the row under the cursor.
    pub fn selected_row_index(&self) -> Option<usize> {
        self.table.as_ref()?.page().rows.get(self.selected_row).copied()
    }

    pub fn selected_column_key(&self) -> Option<String> {
        let table = self.table.as_ref()?;
        table.visible_columns().get(self.selected_column).map(|c| c.key.clone())
    }

    // ---- table controls ------------------------------------------------------

    pub fn next_page(&mut self) {
        if self.table.as_mut().is_some_and(|t| t.next_page()) {
            self.selected_row = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.table.as_mut().is_some_and(|t| t.prev_page()) {
            self.selected_row = 0;
        }
    }

    pub fn first_page(&mut self) {
        if self.table.as_mut().is_some_and(|t| t.first_page()) {
            self.selected_row = 0;
        }
    }

    pub fn last_page(&mut self) {
        if self.table.as_mut().is_some_and(|t| t.last_page()) {
            self.selected_row = 0;
        }
    }

    /// Step the page size through [`PAGE_SIZES`].
    pub fn change_page_size(&mut self, grow: bool) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        let current = table.view().page_size;
        let next = if grow {
            PAGE_SIZES.iter().copied().find(|&n| n > current)
        } else {
            PAGE_SIZES.iter().rev().copied().find(|&n| n < current)
        };
        if let Some(size) = next {
            if let Ok(true) = table.set_page_size(size) {
                self.selected_row = 0;
                self.set_status_message(format!("{} rows per page", size));
            }
        }
    }

    /// Cycle the sort on the column under the cursor.
    pub fn cycle_sort(&mut self) {
        let (Some(key), Some(table)) = (self.selected_column_key(), self.table.as_mut()) else {
            return;
        };
        match table.toggle_sort(&key) {
            Ok(true) => self.selected_row = 0,
            Ok(false) => self.set_status_message(format!("Column '{}' is not sortable", key)),
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    /// Filter the column under the cursor to the value in the selected row.
    pub fn filter_by_selected_cell(&mut self) {
        let (Some(key), Some(index)) = (self.selected_column_key(), self.selected_row_index()) else {
            return;
        };
        let Some(table) = self.table.as_mut() else {
            return;
        };
        let Some(column) = table.model().get(&key) else {
            return;
        };
        let value = column.value(&table.rows()[index]);
        let header = column.header.clone();
        let filter = Filter::Equals(value);
        let label = filter.describe();

        match table.set_filter(&key, filter) {
            Ok(true) => {
                self.selected_row = 0;
                self.set_status_message(format!("Filter: {} {}", header, label));
            }
            Ok(false) => self.set_status_message(format!("Column '{}' is not filterable", header)),
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    pub fn clear_filters(&mut self) {
        if self.table.as_mut().is_some_and(|t| t.clear_filters()) {
            self.set_status_message("Filters cleared");
        }
    }

    // ---- search --------------------------------------------------------------

    pub fn start_search(&mut self) {
        if self.table.as_ref().is_some_and(|t| t.features().enable_search) {
            self.search_active = true;
        }
    }

    /// Leave search input; a pending term still applies when due.
    pub fn cancel_search(&mut self) {
        self.search_active = false;
    }

    pub fn search_push(&mut self, c: char, now: Instant) {
        self.search_text.push(c);
        self.schedule_search(now);
    }

    pub fn search_pop(&mut self, now: Instant) {
        self.search_text.pop();
        self.schedule_search(now);
    }

    fn schedule_search(&mut self, now: Instant) {
        if let Some(table) = self.table.as_mut() {
            table.search_input(self.search_text.clone(), now);
        }
    }

    /// Apply the typed term immediately and leave search input.
    pub fn apply_search(&mut self) {
        self.search_active = false;
        if self.table.as_mut().is_some_and(|t| t.search_now(self.search_text.clone())) {
            self.selected_row = 0;
        }
    }

    pub fn clear_search(&mut self) {
        self.search_text.clear();
        self.search_active = false;
        if self.table.as_mut().is_some_and(|t| t.clear_search()) {
            self.selected_row = 0;
        }
    }

    // ---- actions -------------------------------------------------------------

    /// Toggle selection of the row under the cursor.
    pub fn toggle_mark(&mut self) {
        let Some(index) = self.selected_row_index() else {
            return;
        };
        if let Some(table) = self.table.as_mut() {
            table.toggle_selected(index);
        }
    }

    /// Select every row on the current page.
    pub fn mark_page(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.select_page();
        }
    }

    pub fn clear_marks(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.clear_selection();
        }
    }

    pub fn view_selected(&mut self) {
        self.invoke_row_action("view", "Viewing rows is not permitted");
    }

    pub fn delete_selected(&mut self) {
        self.invoke_row_action("delete", "Deleting rows is not permitted");
    }

    fn invoke_row_action(&mut self, id: &str, refused: &str) {
        let (Some(index), Some(table)) = (self.selected_row_index(), self.table.as_ref()) else {
            return;
        };
        if !table.invoke_row_action(id, index) {
            self.set_status_message(refused);
        }
    }

    /// Delete every marked row.
    pub fn delete_marked(&mut self) {
        let Some(table) = self.table.as_ref() else {
            return;
        };
        if table.selection().is_empty() {
            self.set_status_message("No rows selected");
        } else if !table.invoke_bulk_action("delete-selected") {
            self.set_status_message("Deleting rows is not permitted");
        }
    }

    pub fn export(&mut self) {
        let invoked = self.table.as_ref().is_some_and(|t| t.invoke_header_action("export"));
        if !invoked {
            self.set_status_message("Export is not permitted");
        }
    }

    pub fn refresh(&mut self) {
        let invoked = self.table.as_ref().is_some_and(|t| t.refresh());
        if !invoked {
            self.request_refresh();
        }
    }

    // ---- column menu ---------------------------------------------------------

    pub fn open_column_menu(&mut self) {
        if self.table.is_some() {
            self.show_column_menu = true;
            self.menu_index = 0;
        }
    }

    pub fn close_column_menu(&mut self) {
        self.show_column_menu = false;
        self.clamp_selection();
    }

    pub fn menu_next(&mut self) {
        let total = self.table.as_ref().map_or(0, |t| t.model().len());
        self.menu_index = (self.menu_index + 1).min(total.saturating_sub(1));
    }

    pub fn menu_prev(&mut self) {
        self.menu_index = self.menu_index.saturating_sub(1);
    }

    pub fn menu_column_key(&self) -> Option<String> {
        let table = self.table.as_ref()?;
        table.ordered_columns().get(self.menu_index).map(|c| c.key.clone())
    }

    pub fn menu_toggle_visibility(&mut self) {
        let (Some(key), Some(table)) = (self.menu_column_key(), self.table.as_mut()) else {
            return;
        };
        match table.toggle_column_visibility(&key) {
            Ok(true) => {}
            Ok(false) => self.set_status_message("At least one column must stay visible"),
            Err(e) => self.set_status_message(e.to_string()),
        }
        self.clamp_selection();
    }

    pub fn menu_pin(&mut self, side: Option<PinSide>) {
        let Some(key) = self.menu_column_key() else {
            return;
        };
        if !self.table.as_ref().is_some_and(|t| t.can_pin()) {
            self.set_status_message("Column pinning is not permitted");
            return;
        }
        if let Some(Err(e)) = self.table.as_mut().map(|t| t.pin_column(&key, side)) {
            self.set_status_message(e.to_string());
        }
    }

    /// Move the column under the menu cursor; the cursor follows it.
    pub fn menu_move(&mut self, delta: isize) {
        let (Some(key), Some(table)) = (self.menu_column_key(), self.table.as_mut()) else {
            return;
        };
        match table.move_column(&key, delta) {
            Ok(true) => {
                if let Some(pos) = table.ordered_columns().iter().position(|c| c.key == key) {
                    self.menu_index = pos;
                }
            }
            Ok(false) => {}
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    // ---- overlays ------------------------------------------------------------

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
        self.detail_row = None;
    }

    /// Close the topmost overlay; with none open, clear the search.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.close_overlay();
        } else if self.show_column_menu {
            self.close_column_menu();
        } else if !self.search_text.is_empty() {
            self.clear_search();
        }
    }

    pub fn quit(&mut self) {
        if let Some(table) = self.table.as_mut() {
            table.close();
        }
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ChannelSource;
    use crate::table::{FileStore, Permissions, TableFeatures};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::sync::watch;

    fn rows() -> RowSet {
        let value = json!([
            {"asset_code": "FA-0001", "name": "Laptop", "cost": 900, "status": "Active"},
            {"asset_code": "FA-0002", "name": "Forklift", "cost": 15000, "status": "Retired"},
            {"asset_code": "FA-0003", "name": "Printer", "cost": 300, "status": "Active"}
        ]);
        crate::source::rows_from_value(value).unwrap()
    }

    fn options(permissions: Permissions) -> TableOptions {
        TableOptions {
            permissions,
            features: TableFeatures {
                enable_selection: true,
                ..Default::default()
            },
            page_size: 2,
            id_field: Some("asset_code".into()),
            ..Default::default()
        }
    }

    fn app_with(permissions: Permissions) -> (watch::Sender<RowSet>, App) {
        let (tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), options(permissions));
        tx.send(rows()).unwrap();
        assert!(app.reload_data());
        (tx, app)
    }

    #[test]
    fn test_table_waits_for_rows_to_infer_columns() {
        let (tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), options(Permissions::all()));

        assert!(app.reload_data());
        assert!(app.table.is_none());
        assert!(app.load_error.is_none());

        tx.send(rows()).unwrap();
        assert!(app.reload_data());
        let table = app.table.as_ref().unwrap();
        let keys: Vec<&str> = table.visible_columns().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["asset_code", "name", "cost", "status"]);
    }

    #[test]
    fn test_duplicate_column_definitions_report_error() {
        let (tx, source) = ChannelSource::create("test");
        let defs: Vec<ColumnDef> =
            serde_json::from_str(r#"[{"key":"name"},{"key":"name"}]"#).unwrap();
        let mut app = App::new(Box::new(source), options(Permissions::all())).with_columns(defs);
        tx.send(rows()).unwrap();
        app.reload_data();
        assert!(app.table.is_none());
        assert!(app.load_error.as_deref().unwrap().contains("duplicate column key"));
    }

    #[test]
    fn test_view_action_opens_detail() {
        let (_tx, mut app) = app_with(Permissions::all());
        app.select_next();
        app.view_selected();
        app.tick(Instant::now());
        assert!(app.show_detail_overlay);
        assert_eq!(app.detail_row.as_ref().unwrap()["name"], "Forklift");
        app.go_back();
        assert!(!app.show_detail_overlay);
    }

    #[test]
    fn test_delete_respects_permissions() {
        let (_tx, mut app) = app_with(Permissions::read_only());
        app.delete_selected();
        app.tick(Instant::now());
        assert_eq!(app.table.as_ref().unwrap().rows().len(), 3);
        assert_eq!(app.get_status_message(), Some("Deleting rows is not permitted"));

        let (_tx, mut app) = app_with(Permissions::all());
        app.delete_selected();
        app.tick(Instant::now());
        assert_eq!(app.table.as_ref().unwrap().rows().len(), 2);
    }

    #[test]
    fn test_bulk_delete_marked_rows() {
        let (_tx, mut app) = app_with(Permissions::all());
        app.delete_marked();
        assert_eq!(app.get_status_message(), Some("No rows selected"));

        app.toggle_mark();
        app.select_next();
        app.toggle_mark();
        app.delete_marked();
        app.tick(Instant::now());
        let table = app.table.as_ref().unwrap();
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0]["name"], "Printer");
        assert!(table.selection().is_empty());
    }

    #[test]
    fn test_mark_page_and_clear() {
        let (_tx, mut app) = app_with(Permissions::all());
        app.mark_page();
        assert_eq!(app.table.as_ref().unwrap().selection().len(), 2);
        app.clear_marks();
        assert!(app.table.as_ref().unwrap().selection().is_empty());
    }

    #[test]
    fn test_search_is_debounced_through_tick() {
        let (_tx, mut app) = app_with(Permissions::all());
        let start = Instant::now();
        app.start_search();
        assert!(app.search_active);
        for c in "fork".chars() {
            app.search_push(c, start);
        }
        app.tick(start);
        assert_eq!(app.table.as_ref().unwrap().page().total_count, 3);

        app.tick(start + Duration::from_secs(1));
        assert_eq!(app.table.as_ref().unwrap().page().total_count, 1);

        app.clear_search();
        assert_eq!(app.table.as_ref().unwrap().page().total_count, 3);
    }

    #[test]
    fn test_filter_by_selected_cell() {
        let (_tx, mut app) = app_with(Permissions::all());
        app.select_column_right();
        app.select_column_right();
        app.select_column_right();
        assert_eq!(app.selected_column_key().as_deref(), Some("status"));

        app.filter_by_selected_cell();
        assert_eq!(app.table.as_ref().unwrap().page().total_count, 2);
        app.clear_filters();
        assert_eq!(app.table.as_ref().unwrap().page().total_count, 3);
    }

    #[test]
    fn test_sort_and_paging() {
        let (_tx, mut app) = app_with(Permissions::all());
        app.select_column_right();
        app.select_column_right();
        app.cycle_sort();
        let table = app.table.as_ref().unwrap();
        assert_eq!(table.page_row(0).unwrap()["name"], "Printer");

        app.select_next();
        app.next_page();
        assert_eq!(app.selected_row, 0);
        assert_eq!(app.table.as_ref().unwrap().page().page, 2);

        app.change_page_size(true);
        assert_eq!(app.table.as_ref().unwrap().view().page_size, 5);
        assert_eq!(app.table.as_ref().unwrap().page().page, 1);
    }

    #[test]
    fn test_column_menu() {
        let (_tx, mut app) = app_with(Permissions::all());
        app.open_column_menu();
        app.menu_next();
        app.menu_move(1);
        assert_eq!(app.menu_index, 2);
        assert_eq!(app.menu_column_key().as_deref(), Some("name"));

        app.menu_pin(Some(PinSide::Left));
        app.menu_toggle_visibility();
        let table = app.table.as_ref().unwrap();
        let keys: Vec<&str> = table.visible_columns().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["asset_code", "cost", "status"]);
        assert_eq!(table.view().pinned.get("name"), Some(&PinSide::Left));
    }

    #[test]
    fn test_export_writes_visible_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets.csv");
        let (_tx, mut app) = app_with(Permissions::all());
        app = app.with_export_path(&path);

        app.export();
        app.tick(Instant::now());
        let csv = std::fs::read_to_string(&path).unwrap();
        assert!(csv.starts_with("Asset Code,Name,Cost,Status\r\n"));
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_refresh_redelivers_rows() {
        let (_tx, mut app) = app_with(Permissions::all());
        app.refresh();
        app.tick(Instant::now());
        assert!(!app.table.as_ref().unwrap().is_loading());
        assert!(app.last_updated.is_some());
    }

    #[test]
    fn test_refresh_after_sender_dropped_keeps_controls_live() {
        let (tx, mut app) = app_with(Permissions::all());
        drop(tx);
        app.refresh();
        for _ in 0..3 {
            app.tick(Instant::now());
            app.reload_data();
        }
        assert!(!app.table.as_ref().unwrap().is_loading());
        assert_eq!(app.load_error.as_deref(), Some("Channel closed"));

        app.next_page();
        assert_eq!(app.table.as_ref().unwrap().view().current_page, 2);
    }

    #[test]
    fn test_delete_removes_only_the_row_under_cursor() {
        let (tx, source) = ChannelSource::create("test");
        let options = TableOptions {
            permissions: Permissions::all(),
            ..Default::default()
        };
        let mut app = App::new(Box::new(source), options);
        let rows = json!([{"name": "Chair"}, {"name": "Chair"}, {"name": "Desk"}]);
        tx.send(crate::source::rows_from_value(rows).unwrap()).unwrap();
        assert!(app.reload_data());

        app.select_next();
        app.delete_selected();
        app.tick(Instant::now());
        let names: Vec<&Value> = app.table.as_ref().unwrap().rows().iter().map(|r| &r["name"]).collect();
        assert_eq!(names, vec![&json!("Chair"), &json!("Desk")]);
    }

    #[test]
    fn test_export_follows_saved_layout() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join("state.json");
        let mut opts = options(Permissions::all());
        opts.storage_key = Some("fixed-assets".into());

        {
            let (tx, source) = ChannelSource::create("test");
            let mut app = App::new(Box::new(source), opts.clone())
                .with_store(Box::new(FileStore::open(&state).unwrap()));
            tx.send(rows()).unwrap();
            app.reload_data();
            assert!(app.table.as_mut().unwrap().toggle_column_visibility("cost").unwrap());
        }

        let (tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), opts)
            .with_store(Box::new(FileStore::open(&state).unwrap()));
        tx.send(rows()).unwrap();
        app.reload_data();

        let out = dir.path().join("assets.csv");
        app.export_to(&out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.contains("Name"));
        assert!(!header.contains("Cost"));
    }

    #[test]
    fn test_quit_closes_table() {
        let (_tx, mut app) = app_with(Permissions::all());
        app.quit();
        assert!(!app.running);
        assert!(app.table.as_ref().unwrap().is_closed());
    }
}
