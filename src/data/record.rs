//! The record abstraction rows must implement.

use std::fmt;

use serde_json::{Map, Value};

use super::value::CellValue;

/// A JSON object row, as returned by the backend REST services.
pub type JsonRow = Map<String, Value>;

/// A row that can be displayed in a table.
///
/// The engine never inspects rows beyond these lookups.
pub trait Record {
    /// Value stored under a top-level key.
    fn cell(&self, key: &str) -> CellValue;

    /// Value stored under a dotted path such as `location.site`.
    ///
    /// The default only understands top-level keys.
    fn nested(&self, path: &str) -> CellValue {
        self.cell(path)
    }
}

impl Record for JsonRow {
    fn cell(&self, key: &str) -> CellValue {
        self.get(key).map(CellValue::from_json).unwrap_or_default()
    }

    fn nested(&self, path: &str) -> CellValue {
        let mut parts = path.split('.');
        let Some(first) = parts.next() else {
            return CellValue::Empty;
        };
        let mut current = match self.get(first) {
            Some(value) => value,
            None => return CellValue::Empty,
        };
        for part in parts {
            current = match current {
                Value::Object(map) => match map.get(part) {
                    Some(value) => value,
                    None => return CellValue::Empty,
                },
                Value::Array(items) => match part.parse::<usize>().ok().and_then(|i| items.get(i)) {
                    Some(value) => value,
                    None => return CellValue::Empty,
                },
                _ => return CellValue::Empty,
            };
        }
        CellValue::from_json(current)
    }
}

impl Record for Value {
    fn cell(&self, key: &str) -> CellValue {
        match self {
            Value::Object(map) => map.cell(key),
            _ => CellValue::Empty,
        }
    }

    fn nested(&self, path: &str) -> CellValue {
        match self {
            Value::Object(map) => map.nested(path),
            _ => CellValue::Empty,
        }
    }
}

/// Identity of a row within a table.
///
/// Rows are identified by the stringified value of a configured id field,
/// falling back to their position in the row set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowId {
    Index(usize),
    Key(String),
}

impl RowId {
    /// Resolve the identity of `row` at position `index`.
    pub fn of<R: Record>(row: &R, index: usize, id_field: Option<&str>) -> Self {
        match id_field.map(|field| row.cell(field)) {
            Some(value) if !value.is_empty() => RowId::Key(value.to_string()),
            _ => RowId::Index(index),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Index(i) => write!(f, "#{}", i + 1),
            RowId::Key(k) => f.write_str(k),
        }
    }
}
