//! View-state persistence.
//!
//! A table with a storage key saves its column layout (visibility, order,
//! pins) and page size to a [`ViewStore`], a text key/value store in the
//! manner of browser local storage, and restores it on construction.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::column::{ColumnModel, PinSide};
use super::view::ViewState;
use crate::data::Record;
use crate::error::StoreError;

/// Text key/value storage for persisted layouts.
pub trait ViewStore: Send + Debug {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON document on disk mapping keys to text values.
///
/// Every write rewrites the document through a temporary file and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// document is discarded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::debug!(path = %path.display(), error = %e, "discarding malformed view store");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ViewStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// The persisted subset of a [`ViewState`].
///
/// Every field is optional on load so partial layouts still apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_order: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<BTreeMap<String, PinSide>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl PersistedView {
    /// Capture the persisted fields of `view`.
    pub fn capture(view: &ViewState) -> Self {
        Self {
            visible_columns: Some(view.visible_columns.iter().cloned().collect()),
            column_order: Some(view.column_order.clone()),
            pinned: Some(view.pinned.clone()),
            page_size: Some(view.page_size),
        }
    }

    /// Parse stored text; anything malformed yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match serde_json::from_str(text) {
            Ok(persisted) => Some(persisted),
            Err(e) => {
                tracing::debug!(error = %e, "discarding malformed persisted view");
                None
            }
        }
    }

    /// Merge over `view`. Persisted values win; column keys the model does
    /// not know are dropped.
    pub fn apply<R: Record>(self, model: &ColumnModel<R>, view: &mut ViewState) {
        if let Some(visible) = self.visible_columns {
            let known: BTreeSet<String> =
                visible.into_iter().filter(|key| model.contains(key)).collect();
            if !known.is_empty() {
                view.visible_columns = known;
            }
        }

        if let Some(order) = self.column_order {
            let mut seen = BTreeSet::new();
            let mut merged: Vec<String> = order
                .into_iter()
                .filter(|key| model.contains(key) && seen.insert(key.clone()))
                .collect();
            for key in model.keys() {
                if !seen.contains(key) {
                    merged.push(key.to_string());
                }
            }
            view.column_order = merged;
        }

        if let Some(pinned) = self.pinned {
            view.pinned = pinned.into_iter().filter(|(key, _)| model.contains(key)).collect();
        }

        if let Some(page_size) = self.page_size.filter(|&n| n > 0) {
            view.page_size = page_size;
        }
    }
}

/// Restore the layout stored under `key` into `view`. Returns true if a
/// usable layout was found.
pub fn load<R: Record>(
    store: &dyn ViewStore,
    key: &str,
    model: &ColumnModel<R>,
    view: &mut ViewState,
) -> bool {
    let Some(text) = store.get(key) else {
        return false;
    };
    match PersistedView::parse(&text) {
        Some(persisted) => {
            persisted.apply(model, view);
            true
        }
        None => false,
    }
}

/// Save the layout of `view` under `key`.
pub fn save(store: &mut dyn ViewStore, key: &str, view: &ViewState) -> Result<(), StoreError> {
    let text = serde_json::to_string(&PersistedView::capture(view))?;
    store.set(key, text)
}
