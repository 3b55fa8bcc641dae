//! The reusable data-table engine.
//!
//! [`DataTable`] owns one table instance: its rows, registered columns,
//! [`ViewState`], permissions, feature flags, selection, actions, and the
//! optional persisted layout. Every control mutates one view-state field and
//! recomputes the cached [`ViewPage`].
//!
//! ## Submodules
//!
//! - [`column`]: [`Column`], [`ColumnModel`], pinning, column definitions
//! - [`render`]: per-column [`CellRenderer`] strategies
//! - [`view`]: [`ViewState`], [`SortSpec`], [`Filter`]
//! - [`engine`]: the pure [`compute_view`] pipeline
//! - [`debounce`]: the cancellable search timer
//! - [`action`]: [`Permissions`] and row/header/bulk actions
//! - [`export`]: CSV and JSON export of the visible rows
//! - [`persist`]: [`ViewStore`] backends and layout merging

pub mod action;
pub mod column;
pub mod debounce;
pub mod engine;
pub mod export;
pub mod persist;
pub mod render;
pub mod view;

pub use action::{
    ActionLabel, ActionVariant, BulkAction, HeaderAction, HeaderActionKind, Permission,
    Permissions, RowAction, RowActionKind,
};
pub use column::{infer_columns, Column, ColumnDef, ColumnModel, PinSide};
pub use debounce::{Debouncer, MIN_DEBOUNCE};
pub use engine::{compute_view, filter_and_sort, ViewPage};
pub use export::ExportFormat;
pub use persist::{FileStore, MemoryStore, PersistedView, ViewStore};
pub use render::{CellRenderer, RendererSpec};
pub use view::{Filter, SortDirection, SortSpec, ViewState};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::data::{Record, RowId};
use crate::error::TableError;

/// Behavioral switches for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFeatures {
    pub enable_search: bool,
    pub enable_pagination: bool,
    pub enable_sorting: bool,
    pub enable_filtering: bool,
    pub enable_column_visibility: bool,
    pub enable_column_pinning: bool,
    pub enable_export: bool,
    pub enable_selection: bool,
}

impl Default for TableFeatures {
    fn default() -> Self {
        Self {
            enable_search: true,
            enable_pagination: true,
            enable_sorting: true,
            enable_filtering: true,
            enable_column_visibility: true,
            enable_column_pinning: true,
            enable_export: true,
            enable_selection: false,
        }
    }
}

/// Construction options for a [`DataTable`].
#[derive(Debug, Clone)]
pub struct TableOptions {
    pub permissions: Permissions,
    pub features: TableFeatures,
    pub page_size: usize,
    pub empty_message: String,
    /// Key the column layout is persisted under. Nothing is persisted without it.
    pub storage_key: Option<String>,
    /// Field whose value identifies a row; rows fall back to their index.
    pub id_field: Option<String>,
    pub search_debounce: Duration,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            permissions: Permissions::default(),
            features: TableFeatures::default(),
            page_size: 10,
            empty_message: "No records found".to_string(),
            storage_key: None,
            id_field: None,
            search_debounce: Duration::from_millis(300),
        }
    }
}

/// One table instance.
pub struct DataTable<R> {
    model: ColumnModel<R>,
    rows: Vec<R>,
    view: ViewState,
    page: ViewPage,
    permissions: Permissions,
    features: TableFeatures,
    empty_message: String,
    id_field: Option<String>,
    storage_key: Option<String>,
    store: Option<Box<dyn ViewStore>>,
    search: Debouncer<String>,
    loading: bool,
    closed: bool,
    selection: BTreeSet<RowId>,
    row_actions: Vec<RowAction<R>>,
    header_actions: Vec<HeaderAction>,
    bulk_actions: Vec<BulkAction<R>>,
    on_refresh: Option<action::Callback>,
}

impl<R> fmt::Debug for DataTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("rows", &self.rows.len())
            .field("view", &self.view)
            .field("page", &self.page)
            .field("permissions", &self.permissions)
            .field("features", &self.features)
            .field("storage_key", &self.storage_key)
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

impl<R: Record> DataTable<R> {
    /// Register `columns` and build the default view.
    pub fn new(columns: Vec<Column<R>>, rows: Vec<R>, options: TableOptions) -> Result<Self, TableError> {
        if options.page_size == 0 {
            return Err(TableError::InvalidPageSize);
        }
        let model = ColumnModel::register(columns)?;
        let view = model.default_view(options.page_size);

        let mut table = Self {
            model,
            rows,
            view,
            page: ViewPage::empty(),
            permissions: options.permissions,
            features: options.features,
            empty_message: options.empty_message,
            id_field: options.id_field,
            storage_key: options.storage_key,
            store: None,
            search: Debouncer::new(options.search_debounce),
            loading: false,
            closed: false,
            selection: BTreeSet::new(),
            row_actions: Vec::new(),
            header_actions: Vec::new(),
            bulk_actions: Vec::new(),
            on_refresh: None,
        };
        table.recompute();
        Ok(table)
    }

    /// Attach a store and restore the layout saved under the storage key.
    pub fn with_store(mut self, store: Box<dyn ViewStore>) -> Self {
        if let Some(key) = &self.storage_key {
            if persist::load(&*store, key, &self.model, &mut self.view) {
                tracing::debug!(key = %key, "restored persisted table layout");
            }
        }
        self.store = Some(store);
        self.recompute();
        self
    }

    pub fn with_row_action(mut self, action: RowAction<R>) -> Self {
        self.row_actions.push(action);
        self
    }

    pub fn with_header_action(mut self, action: HeaderAction) -> Self {
        self.header_actions.push(action);
        self
    }

    pub fn with_bulk_action(mut self, action: BulkAction<R>) -> Self {
        self.bulk_actions.push(action);
        self
    }

    pub fn on_refresh<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_refresh = Some(Arc::new(f));
        self
    }

    // ---- accessors -------------------------------------------------------

    pub fn model(&self) -> &ColumnModel<R> {
        &self.model
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn page(&self) -> &ViewPage {
        &self.page
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn features(&self) -> &TableFeatures {
        &self.features
    }

    pub fn empty_message(&self) -> &str {
        &self.empty_message
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Rows on the current page, in display order.
    pub fn page_rows(&self) -> Vec<&R> {
        self.page.rows.iter().map(|&i| &self.rows[i]).collect()
    }

    /// Row at a position on the current page.
    pub fn page_row(&self, position: usize) -> Option<&R> {
        self.page.rows.get(position).map(|&i| &self.rows[i])
    }

    /// Visible columns in render order.
    pub fn visible_columns(&self) -> Vec<&Column<R>> {
        self.model.visible(&self.view)
    }

    /// All columns in the current order, for column menus.
    pub fn ordered_columns(&self) -> Vec<&Column<R>> {
        self.model.ordered(&self.view)
    }

    /// True when the current page has no rows and the empty-state message
    /// should be shown.
    pub fn shows_empty_state(&self) -> bool {
        self.page.is_empty()
    }

    pub fn row_id(&self, index: usize) -> Option<RowId> {
        self.rows.get(index).map(|row| RowId::of(row, index, self.id_field.as_deref()))
    }

    // ---- data and lifecycle ----------------------------------------------

    /// Replace the row set. Selections of rows that no longer exist are dropped,
    /// as are positional selections, since positions shift with the new set.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        let present: BTreeSet<RowId> = (0..self.rows.len()).filter_map(|i| self.row_id(i)).collect();
        self.selection
            .retain(|id| matches!(id, RowId::Key(_)) && present.contains(id));
        self.recompute();
    }

    /// While loading, every interaction control is a no-op.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Tear the table down. A pending search is cancelled and never applied.
    pub fn close(&mut self) {
        if self.search.cancel() {
            tracing::debug!("cancelled pending search on close");
        }
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn interactive(&self) -> bool {
        !self.loading && !self.closed
    }

    /// Rerun the pipeline against the current rows and view.
    fn recompute(&mut self) {
        let page_size = self.view.page_size.max(1);
        let matched = filter_and_sort(&self.model, &self.rows, &self.view);
        self.page = if self.features.enable_pagination {
            engine::paginate(matched, self.view.current_page, page_size)
        } else {
            let total = matched.len();
            ViewPage {
                rows: matched,
                total_count: total,
                page: 1,
                page_count: 1,
            }
        };
        self.view.current_page = self.page.page;
        tracing::debug!(
            total = self.page.total_count,
            page = self.page.page,
            page_count = self.page.page_count,
            "recomputed table view"
        );
    }

    /// Save the layout if a storage key and store are configured.
    fn save_layout(&mut self) {
        let (Some(key), Some(store)) = (&self.storage_key, self.store.as_mut()) else {
            return;
        };
        if let Err(e) = persist::save(&mut **store, key, &self.view) {
            tracing::warn!(key = %key, error = %e, "failed to persist table layout");
        }
    }

    // ---- search ------------------------------------------------------------

    /// Record a keystroke in the search box. The term is applied by
    /// [`tick`](Self::tick) once the debounce delay passes.
    pub fn search_input(&mut self, text: impl Into<String>, now: Instant) -> bool {
        if !self.features.enable_search || !self.interactive() {
            return false;
        }
        self.search.schedule(text.into(), now);
        true
    }

    /// Apply a debounced search term if it is due. Returns true if the view changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.closed {
            return false;
        }
        match self.search.poll(now) {
            Some(term) => self.apply_search(term),
            None => false,
        }
    }

    /// Deadline of the pending search, for event-loop timeouts.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    /// The term the user typed but that is not yet applied.
    pub fn pending_search(&self) -> Option<&str> {
        self.search.pending().map(String::as_str)
    }

    /// Apply a search term immediately, dropping any pending one.
    pub fn search_now(&mut self, text: impl Into<String>) -> bool {
        if !self.features.enable_search || !self.interactive() {
            return false;
        }
        self.search.cancel();
        self.apply_search(text.into())
    }

    pub fn clear_search(&mut self) -> bool {
        self.search_now(String::new())
    }

    fn apply_search(&mut self, term: String) -> bool {
        if self.view.search_term == term {
            return false;
        }
        self.view.search_term = term;
        self.recompute();
        true
    }

    // ---- sorting -----------------------------------------------------------

    /// Cycle the sort on `key`: unsorted → ascending → descending → unsorted.
    pub fn toggle_sort(&mut self, key: &str) -> Result<bool, TableError> {
        let column = self.model.require(key)?;
        if !self.features.enable_sorting || !column.sortable || !self.interactive() {
            return Ok(false);
        }
        self.view.sort = match self.view.sort_direction(key) {
            None => Some(SortSpec::ascending(key)),
            Some(SortDirection::Ascending) => Some(SortSpec::descending(key)),
            Some(SortDirection::Descending) => None,
        };
        self.recompute();
        Ok(true)
    }

    pub fn clear_sort(&mut self) -> bool {
        if self.view.sort.is_none() || !self.interactive() {
            return false;
        }
        self.view.sort = None;
        self.recompute();
        true
    }

    // ---- filtering ---------------------------------------------------------

    pub fn set_filter(&mut self, key: &str, filter: Filter) -> Result<bool, TableError> {
        let column = self.model.require(key)?;
        if !self.features.enable_filtering || !column.filterable || !self.interactive() {
            return Ok(false);
        }
        if self.view.filters.get(key) == Some(&filter) {
            return Ok(false);
        }
        self.view.filters.insert(key.to_string(), filter);
        self.recompute();
        Ok(true)
    }

    pub fn clear_filter(&mut self, key: &str) -> Result<bool, TableError> {
        self.model.require(key)?;
        if !self.interactive() || self.view.filters.remove(key).is_none() {
            return Ok(false);
        }
        self.recompute();
        Ok(true)
    }

    pub fn clear_filters(&mut self) -> bool {
        if !self.interactive() || self.view.filters.is_empty() {
            return false;
        }
        self.view.filters.clear();
        self.recompute();
        true
    }

    // ---- columns -----------------------------------------------------------

    /// Show or hide `key`. Hiding the last visible column is refused.
    pub fn toggle_column_visibility(&mut self, key: &str) -> Result<bool, TableError> {
        let visible = !self.view.visible_columns.contains(key);
        self.set_column_visible(key, visible)
    }

    pub fn set_column_visible(&mut self, key: &str, visible: bool) -> Result<bool, TableError> {
        self.model.require(key)?;
        if !self.features.enable_column_visibility || !self.interactive() {
            return Ok(false);
        }
        let changed = if visible {
            self.view.visible_columns.insert(key.to_string())
        } else {
            self.view.visible_columns.len() > 1 && self.view.visible_columns.remove(key)
        };
        if changed {
            self.recompute();
            self.save_layout();
        }
        Ok(changed)
    }

    /// Whether pin controls are enabled.
    pub fn can_pin(&self) -> bool {
        self.features.enable_column_pinning && self.permissions.can_manage_columns
    }

    /// Pin `key` to a side, or unpin it with `None`.
    pub fn pin_column(&mut self, key: &str, side: Option<PinSide>) -> Result<bool, TableError> {
        self.model.require(key)?;
        if !self.can_pin() || !self.interactive() {
            return Ok(false);
        }
        let previous = match side {
            Some(side) => self.view.pinned.insert(key.to_string(), side),
            None => self.view.pinned.remove(key),
        };
        if previous == side {
            return Ok(false);
        }
        self.recompute();
        self.save_layout();
        Ok(true)
    }

    /// Move `key` by `delta` positions in the column order.
    pub fn move_column(&mut self, key: &str, delta: isize) -> Result<bool, TableError> {
        self.model.require(key)?;
        if !self.permissions.can_manage_columns || !self.interactive() {
            return Ok(false);
        }
        let mut order: Vec<String> =
            self.model.ordered(&self.view).iter().map(|c| c.key.clone()).collect();
        let Some(from) = order.iter().position(|k| k == key) else {
            return Ok(false);
        };
        let to = (from as isize + delta).clamp(0, order.len() as isize - 1) as usize;
        if to == from {
            return Ok(false);
        }
        let moved = order.remove(from);
        order.insert(to, moved);
        self.view.column_order = order;
        self.recompute();
        self.save_layout();
        Ok(true)
    }

    // ---- pagination --------------------------------------------------------

    /// Change the page size and return to the first page.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<bool, TableError> {
        if page_size == 0 {
            return Err(TableError::InvalidPageSize);
        }
        if !self.features.enable_pagination || !self.interactive() {
            return Ok(false);
        }
        let changed = self.view.page_size != page_size || self.view.current_page != 1;
        self.view.page_size = page_size;
        self.view.current_page = 1;
        self.recompute();
        self.save_layout();
        Ok(changed)
    }

    pub fn has_next_page(&self) -> bool {
        self.page.has_next()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page.has_prev()
    }

    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        self.go_to_page(self.page.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.has_prev_page() {
            return false;
        }
        self.go_to_page(self.page.page - 1)
    }

    pub fn first_page(&mut self) -> bool {
        self.go_to_page(1)
    }

    pub fn last_page(&mut self) -> bool {
        self.go_to_page(self.page.page_count)
    }

    /// Jump to a page; out-of-range pages clamp.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if !self.features.enable_pagination || !self.interactive() {
            return false;
        }
        let page = page.clamp(1, self.page.page_count);
        if page == self.page.page {
            return false;
        }
        self.view.current_page = page;
        self.recompute();
        true
    }

    // ---- selection ---------------------------------------------------------

    pub fn is_selected(&self, index: usize) -> bool {
        self.row_id(index).is_some_and(|id| self.selection.contains(&id))
    }

    /// Toggle selection of the row at `index` in the row set.
    pub fn toggle_selected(&mut self, index: usize) -> bool {
        if !self.features.enable_selection || !self.interactive() {
            return false;
        }
        let Some(id) = self.row_id(index) else {
            return false;
        };
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
        true
    }

    /// Select every row on the current page.
    pub fn select_page(&mut self) -> bool {
        if !self.features.enable_selection || !self.interactive() {
            return false;
        }
        let ids: Vec<RowId> = self.page.rows.iter().filter_map(|&i| self.row_id(i)).collect();
        let before = self.selection.len();
        self.selection.extend(ids);
        self.selection.len() != before
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.selection.clear();
        true
    }

    pub fn selection(&self) -> &BTreeSet<RowId> {
        &self.selection
    }

    /// Selected rows in row-set order.
    pub fn selected_rows(&self) -> Vec<&R> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(i, _)| self.is_selected(*i))
            .map(|(_, row)| row)
            .collect()
    }

    // ---- actions -----------------------------------------------------------

    /// Row actions the current permissions allow.
    pub fn row_actions(&self) -> Vec<&RowAction<R>> {
        self.row_actions.iter().filter(|a| a.permitted(&self.permissions)).collect()
    }

    /// Header actions the current permissions and features allow.
    pub fn header_actions(&self) -> Vec<&HeaderAction> {
        self.header_actions
            .iter()
            .filter(|a| a.permitted(&self.permissions))
            .filter(|a| a.kind != HeaderActionKind::Export || self.features.enable_export)
            .collect()
    }

    /// Bulk actions, offered only while selection is enabled.
    pub fn bulk_actions(&self) -> Vec<&BulkAction<R>> {
        if !self.features.enable_selection {
            return Vec::new();
        }
        self.bulk_actions.iter().filter(|a| a.permitted(&self.permissions)).collect()
    }

    /// Run a permitted row action against the row at `index` in the row set.
    pub fn invoke_row_action(&self, id: &str, index: usize) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        match self.row_actions().into_iter().find(|a| a.id() == id) {
            Some(action) => {
                (action.on_click)(row);
                true
            }
            None => false,
        }
    }

    pub fn invoke_header_action(&self, id: &str) -> bool {
        match self.header_actions().into_iter().find(|a| a.id() == id) {
            Some(action) => {
                (action.on_click)();
                true
            }
            None => false,
        }
    }

    /// Run a permitted bulk action over the selection. Nothing runs when the
    /// selection is empty.
    pub fn invoke_bulk_action(&self, id: &str) -> bool {
        let selected = self.selected_rows();
        if selected.is_empty() {
            return false;
        }
        match self.bulk_actions().into_iter().find(|a| a.id() == id) {
            Some(action) => {
                (action.on_click)(&selected);
                true
            }
            None => false,
        }
    }

    /// Invoke the refresh callback, if one is registered.
    pub fn refresh(&self) -> bool {
        match &self.on_refresh {
            Some(f) => {
                f();
                true
            }
            None => false,
        }
    }

    // ---- export ------------------------------------------------------------

    pub fn can_export(&self) -> bool {
        self.features.enable_export && self.permissions.can_export
    }

    /// Serialize every row matching search and filters, in sorted order,
    /// using the visible columns only.
    pub fn export(&self, format: ExportFormat) -> Result<String, TableError> {
        if !self.can_export() {
            return Err(TableError::ExportNotPermitted);
        }
        let columns = self.visible_columns();
        let matched = filter_and_sort(&self.model, &self.rows, &self.view);
        export::export_rows(&columns, matched.iter().map(|&i| &self.rows[i]), format)
    }
}

impl<R> Drop for DataTable<R> {
    fn drop(&mut self) {
        self.search.cancel();
    }
}
