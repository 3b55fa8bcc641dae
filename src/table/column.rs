//! Column model.
//!
//! A [`Column`] describes how one field of a record is read, displayed, and
//! which controls apply to it. [`ColumnModel`] holds the registered columns and
//! resolves the visible, ordered, pin-aware column list for a [`ViewState`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::render::{CellRenderer, RendererSpec};
use super::view::{Filter, ViewState};
use crate::data::{CellValue, JsonRow, Record};
use crate::error::TableError;

/// Edge a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinSide {
    Left,
    Right,
}

impl PinSide {
    pub fn label(&self) -> &'static str {
        match self {
            PinSide::Left => "left",
            PinSide::Right => "right",
        }
    }
}

/// Computes a cell value from a whole record.
pub type ComputeFn<R> = Arc<dyn Fn(&R) -> CellValue + Send + Sync>;

/// Custom filter predicate, replacing the built-in [`Filter::matches`].
pub type FilterFn = Arc<dyn Fn(&CellValue, &Filter) -> bool + Send + Sync>;

/// How a column reads its value out of a record.
pub enum Accessor<R> {
    /// `record.cell(column.key)`.
    Key,
    /// A dotted path into nested records.
    Path(String),
    /// Derived from the whole record.
    Computed(ComputeFn<R>),
}

impl<R> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        match self {
            Accessor::Key => Accessor::Key,
            Accessor::Path(p) => Accessor::Path(p.clone()),
            Accessor::Computed(f) => Accessor::Computed(Arc::clone(f)),
        }
    }
}

impl<R> fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Key => f.write_str("Key"),
            Accessor::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Accessor::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// A table column.
pub struct Column<R> {
    pub key: String,
    pub header: String,
    pub accessor: Accessor<R>,
    pub renderer: CellRenderer,
    pub sortable: bool,
    pub filterable: bool,
    pub searchable: bool,
    /// Visible when no layout has been persisted.
    pub visible: bool,
    /// Initial pin side.
    pub pin: Option<PinSide>,
    /// Relative width weight used by the terminal renderer.
    pub width: u16,
    pub filter_fn: Option<FilterFn>,
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: self.header.clone(),
            accessor: self.accessor.clone(),
            renderer: self.renderer.clone(),
            sortable: self.sortable,
            filterable: self.filterable,
            searchable: self.searchable,
            visible: self.visible,
            pin: self.pin,
            width: self.width,
            filter_fn: self.filter_fn.clone(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("accessor", &self.accessor)
            .field("renderer", &self.renderer)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("searchable", &self.searchable)
            .field("visible", &self.visible)
            .field("pin", &self.pin)
            .finish_non_exhaustive()
    }
}

impl<R: Record> Column<R> {
    /// A visible text column reading `key`, with every control enabled.
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            accessor: Accessor::Key,
            renderer: CellRenderer::Text,
            sortable: true,
            filterable: true,
            searchable: true,
            visible: true,
            pin: None,
            width: 1,
            filter_fn: None,
        }
    }

    pub fn renderer(mut self, renderer: CellRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.accessor = Accessor::Path(path.into());
        self
    }

    pub fn computed<F>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> CellValue + Send + Sync + 'static,
    {
        self.accessor = Accessor::Computed(Arc::new(f));
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn pinned(mut self, side: PinSide) -> Self {
        self.pin = Some(side);
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn filter_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&CellValue, &Filter) -> bool + Send + Sync + 'static,
    {
        self.filter_fn = Some(Arc::new(f));
        self
    }

    /// Read this column's value from `row`.
    pub fn value(&self, row: &R) -> CellValue {
        match &self.accessor {
            Accessor::Key => row.cell(&self.key),
            Accessor::Path(path) => row.nested(path),
            Accessor::Computed(f) => f(row),
        }
    }

    /// Rendered display text for `row`.
    pub fn display(&self, row: &R) -> String {
        self.renderer.render(&self.value(row))
    }

    /// Whether `row` passes `filter` on this column.
    pub fn matches_filter(&self, row: &R, filter: &Filter) -> bool {
        let value = self.value(row);
        match &self.filter_fn {
            Some(f) => f(&value, filter),
            None => filter.matches(&value),
        }
    }
}

/// The registered, ordered set of columns of one table.
#[derive(Debug, Clone)]
pub struct ColumnModel<R> {
    columns: Vec<Column<R>>,
    index: HashMap<String, usize>,
}

impl<R: Record> ColumnModel<R> {
    /// Register columns, rejecting duplicate keys.
    pub fn register(columns: Vec<Column<R>>) -> Result<Self, TableError> {
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if index.insert(column.key.clone(), i).is_some() {
                return Err(TableError::DuplicateColumnKey(column.key.clone()));
            }
        }

        Ok(Self { columns, index })
    }

    /// Columns in declared order.
    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Column<R>> {
        self.index.get(key).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Like [`get`](Self::get), but an unknown key is an error.
    pub fn require(&self, key: &str) -> Result<&Column<R>, TableError> {
        self.get(key).ok_or_else(|| TableError::UnknownColumn(key.to_string()))
    }

    /// Keys in declared order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    /// Initial view state built from the declared visibility and pins.
    pub fn default_view(&self, page_size: usize) -> ViewState {
        let mut view = ViewState::new(page_size);
        view.column_order = self.keys().map(str::to_string).collect();
        view.visible_columns = self
            .columns
            .iter()
            .filter(|c| c.visible)
            .map(|c| c.key.clone())
            .collect();
        if view.visible_columns.is_empty() {
            view.visible_columns.insert(self.columns[0].key.clone());
        }
        view.pinned = self
            .columns
            .iter()
            .filter_map(|c| c.pin.map(|side| (c.key.clone(), side)))
            .collect::<BTreeMap<_, _>>();
        view
    }

    /// All columns in the view's order: known keys from `column_order`
    /// followed by any registered column it does not mention.
    pub fn ordered<'a>(&'a self, view: &ViewState) -> Vec<&'a Column<R>> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        let mut out = Vec::with_capacity(self.columns.len());
        for key in &view.column_order {
            if let Some(column) = self.get(key) {
                if seen.insert(column.key.as_str()) {
                    out.push(column);
                }
            }
        }
        for column in &self.columns {
            if seen.insert(column.key.as_str()) {
                out.push(column);
            }
        }
        out
    }

    /// Visible columns in render order: pinned-left first, then unpinned,
    /// then pinned-right. Each group keeps the view's column order.
    pub fn visible<'a>(&'a self, view: &ViewState) -> Vec<&'a Column<R>> {
        let mut left = Vec::new();
        let mut middle = Vec::new();
        let mut right = Vec::new();

        for column in self.ordered(view) {
            if !view.visible_columns.contains(&column.key) {
                continue;
            }
            match view.pinned.get(&column.key) {
                Some(PinSide::Left) => left.push(column),
                Some(PinSide::Right) => right.push(column),
                None => middle.push(column),
            }
        }

        left.extend(middle);
        left.extend(right);
        left
    }
}

/// Serializable column definition, as read from a column configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub key: String,
    #[serde(default)]
    pub header: Option<String>,
    /// Dotted path to read instead of `key`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub renderer: Option<RendererSpec>,
    #[serde(default = "yes")]
    pub sortable: bool,
    #[serde(default = "yes")]
    pub filterable: bool,
    #[serde(default = "yes")]
    pub searchable: bool,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub pin: Option<PinSide>,
    #[serde(default)]
    pub width: Option<u16>,
}

fn yes() -> bool {
    true
}

impl ColumnDef {
    /// Build a column from this definition.
    pub fn into_column<R: Record>(self) -> Column<R> {
        let header = self.header.unwrap_or_else(|| humanize(&self.key));
        let mut column = Column::new(self.key, header)
            .sortable(self.sortable)
            .filterable(self.filterable)
            .searchable(self.searchable);
        if let Some(path) = self.path {
            column = column.path(path);
        }
        if let Some(spec) = self.renderer {
            column = column.renderer(spec.into());
        }
        if !self.visible {
            column = column.hidden();
        }
        if let Some(side) = self.pin {
            column = column.pinned(side);
        }
        if let Some(width) = self.width {
            column = column.width(width);
        }
        column
    }
}

/// Derive column definitions from the fields of a sample row.
///
/// Numbers get a number renderer, booleans a yes/no renderer, and everything
/// else is shown as text.
pub fn infer_columns(sample: &JsonRow) -> Vec<ColumnDef> {
    sample
        .iter()
        .map(|(key, value)| {
            let renderer = match value {
                Value::Number(n) if n.is_f64() => Some(RendererSpec::Number { decimals: 2 }),
                Value::Number(_) => Some(RendererSpec::Number { decimals: 0 }),
                Value::Bool(_) => Some(RendererSpec::Boolean {
                    yes: "Yes".into(),
                    no: "No".into(),
                }),
                _ => None,
            };
            ColumnDef {
                key: key.clone(),
                header: None,
                path: None,
                renderer,
                sortable: true,
                filterable: true,
                searchable: true,
                visible: true,
                pin: None,
                width: None,
            }
        })
        .collect()
}

/// Turn `asset_code` or `assetCode` into `Asset Code`.
pub fn humanize(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if c == '_' || c == '-' || c == ' ' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Row = serde_json::Value;

    fn columns() -> Vec<Column<Row>> {
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("cost", "Cost"),
            Column::new("site", "Site"),
        ]
    }

    fn keys(cols: Vec<&Column<Row>>) -> Vec<&str> {
        cols.into_iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn test_register_rejects_duplicate_keys() {
        let mut cols = columns();
        cols.push(Column::new("name", "Name again"));
        match ColumnModel::register(cols) {
            Err(TableError::DuplicateColumnKey(key)) => assert_eq!(key, "name"),
            other => panic!("expected duplicate key error, got {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn test_register_rejects_empty() {
        assert!(matches!(
            ColumnModel::<Row>::register(Vec::new()),
            Err(TableError::NoColumns)
        ));
    }

    #[test]
    fn test_visible_places_pins_at_edges() {
        let model = ColumnModel::register(columns()).unwrap();
        let mut view = model.default_view(10);
        view.pinned.insert("site".into(), PinSide::Left);
        view.pinned.insert("id".into(), PinSide::Right);
        assert_eq!(keys(model.visible(&view)), vec!["site", "name", "cost", "id"]);
    }

    #[test]
    fn test_visible_respects_order_and_visibility() {
        let model = ColumnModel::register(columns()).unwrap();
        let mut view = model.default_view(10);
        view.column_order = vec!["cost".into(), "id".into()];
        view.visible_columns.remove("name");
        assert_eq!(keys(model.visible(&view)), vec!["cost", "id", "site"]);
    }

    #[test]
    fn test_default_view_uses_declared_flags() {
        let model = ColumnModel::register(vec![
            Column::<Row>::new("id", "ID").pinned(PinSide::Left),
            Column::new("notes", "Notes").hidden(),
        ])
        .unwrap();
        let view = model.default_view(25);
        assert_eq!(view.page_size, 25);
        assert!(view.visible_columns.contains("id"));
        assert!(!view.visible_columns.contains("notes"));
        assert_eq!(view.pinned.get("id"), Some(&PinSide::Left));
    }

    #[test]
    fn test_default_view_keeps_one_column_visible() {
        let model = ColumnModel::register(vec![Column::<Row>::new("id", "ID").hidden()]).unwrap();
        let view = model.default_view(10);
        assert_eq!(view.visible_columns.len(), 1);
    }

    #[test]
    fn test_accessors() {
        let row = json!({"name": "Drill", "location": {"site": "Chennai"}, "qty": 2, "rate": 5});
        let path: Column<Row> = Column::new("site", "Site").path("location.site");
        assert_eq!(path.value(&row), CellValue::Text("Chennai".into()));

        let computed: Column<Row> = Column::new("total", "Total").computed(|r: &Row| {
            let qty = r.cell("qty").as_number().unwrap_or(0.0);
            let rate = r.cell("rate").as_number().unwrap_or(0.0);
            CellValue::Number(qty * rate)
        });
        assert_eq!(computed.display(&row), "10");
    }

    #[test]
    fn test_column_def_defaults() {
        let def: ColumnDef =
            serde_json::from_str(r#"{"key":"purchase_date","renderer":{"type":"date"}}"#).unwrap();
        assert!(def.sortable && def.visible);
        let column: Column<Row> = def.into_column();
        assert_eq!(column.header, "Purchase Date");
        assert_eq!(
            column.display(&json!({"purchase_date": "2023-04-01"})),
            "01-04-2023"
        );
    }

    #[test]
    fn test_infer_columns() {
        let sample = json!({"id": 1, "cost": 10.5, "active": true, "name": "x"});
        let defs = infer_columns(sample.as_object().unwrap());
        let keys: Vec<&str> = defs.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["id", "cost", "active", "name"]);
        assert_eq!(defs[0].renderer, Some(RendererSpec::Number { decimals: 0 }));
        assert_eq!(defs[1].renderer, Some(RendererSpec::Number { decimals: 2 }));
        assert_eq!(defs[3].renderer, None);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("asset_code"), "Asset Code");
        assert_eq!(humanize("assetCode"), "Asset Code");
        assert_eq!(humanize("id"), "Id");
        assert_eq!(humanize("cwip-stage"), "Cwip Stage");
    }
}
