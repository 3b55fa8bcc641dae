//! View state: the serializable parameters that decide which rows are shown
//! and how.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::column::PinSide;
use crate::data::CellValue;

/// Sort direction of the active sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Header arrow for this direction.
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// The active sort: one column and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// A per-column filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum Filter {
    /// Exact match. Numeric values match numerically ("42" equals 42).
    Equals(CellValue),
    /// Case-insensitive substring.
    Contains(String),
    /// Exact match against any of the values.
    OneOf(Vec<CellValue>),
    /// Inclusive numeric range; non-numeric cells never match.
    Range { min: Option<f64>, max: Option<f64> },
    /// Any non-empty value.
    NotEmpty,
}

impl Filter {
    /// Whether `value` passes this filter.
    pub fn matches(&self, value: &CellValue) -> bool {
        match self {
            Filter::Equals(target) => value.compare(target) == Ordering::Equal,
            Filter::Contains(needle) => value.contains_lowercase(&needle.to_lowercase()),
            Filter::OneOf(targets) => targets.iter().any(|t| value.compare(t) == Ordering::Equal),
            Filter::Range { min, max } => match value.as_number() {
                Some(n) => min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi),
                None => false,
            },
            Filter::NotEmpty => !value.is_empty(),
        }
    }

    /// Short description for status lines.
    pub fn describe(&self) -> String {
        match self {
            Filter::Equals(v) => format!("= {}", v),
            Filter::Contains(s) => format!("~ {}", s),
            Filter::OneOf(vs) => {
                let parts: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                format!("in [{}]", parts.join(", "))
            }
            Filter::Range { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => format!("{}..{}", lo, hi),
                (Some(lo), None) => format!(">= {}", lo),
                (None, Some(hi)) => format!("<= {}", hi),
                (None, None) => "any".to_string(),
            },
            Filter::NotEmpty => "not empty".to_string(),
        }
    }
}

/// Everything that controls which rows are shown, in which order, with
/// which columns.
///
/// This is a plain value: the engine computes the visible page from
/// `(rows, ViewState)` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub search_term: String,
    pub filters: BTreeMap<String, Filter>,
    pub sort: Option<SortSpec>,
    /// 1-based.
    pub current_page: usize,
    pub page_size: usize,
    pub visible_columns: BTreeSet<String>,
    pub column_order: Vec<String>,
    pub pinned: BTreeMap<String, PinSide>,
}

impl ViewState {
    /// Empty view state on page 1. Columns are filled in by
    /// [`ColumnModel::default_view`](super::column::ColumnModel::default_view).
    pub fn new(page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            current_page: 1,
            page_size,
            visible_columns: BTreeSet::new(),
            column_order: Vec::new(),
            pinned: BTreeMap::new(),
        }
    }

    /// Current sort direction for `column`, if it is the sort column.
    pub fn sort_direction(&self, column: &str) -> Option<SortDirection> {
        self.sort.as_ref().filter(|s| s.column == column).map(|s| s.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_filter() {
        let f = Filter::Equals(CellValue::Number(42.0));
        assert!(f.matches(&CellValue::Text("42".into())));
        assert!(!f.matches(&CellValue::Number(41.0)));

        let f = Filter::Equals(CellValue::Text("Open".into()));
        assert!(f.matches(&CellValue::Text("Open".into())));
        assert!(!f.matches(&CellValue::Text("open".into())));
    }

    #[test]
    fn test_range_filter() {
        let f = Filter::Range {
            min: Some(10.0),
            max: Some(20.0),
        };
        assert!(f.matches(&CellValue::Number(10.0)));
        assert!(f.matches(&CellValue::Text("20".into())));
        assert!(!f.matches(&CellValue::Number(20.5)));
        assert!(!f.matches(&CellValue::Text("abc".into())));
        assert!(!f.matches(&CellValue::Empty));
    }

    #[test]
    fn test_contains_and_one_of() {
        assert!(Filter::Contains("LAP".into()).matches(&CellValue::Text("laptop".into())));
        let f = Filter::OneOf(vec!["Open".into(), "Closed".into()]);
        assert!(f.matches(&CellValue::Text("Closed".into())));
        assert!(!f.matches(&CellValue::Text("Pending".into())));
        assert!(Filter::NotEmpty.matches(&CellValue::Bool(false)));
        assert!(!Filter::NotEmpty.matches(&CellValue::Empty));
    }

    #[test]
    fn test_view_state_json_layout() {
        let mut view = ViewState::new(10);
        view.sort = Some(SortSpec::descending("cost"));
        view.filters.insert("status".into(), Filter::Equals("Open".into()));
        view.pinned.insert("id".into(), PinSide::Left);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["sort"]["direction"], "desc");
        assert_eq!(json["filters"]["status"]["op"], "equals");
        assert_eq!(json["filters"]["status"]["value"], "Open");
        assert_eq!(json["pinned"]["id"], "left");
        assert_eq!(json["pageSize"], 10);

        let back: ViewState = serde_json::from_value(json).unwrap();
        assert_eq!(back, view);
    }

    #[test]
    fn test_sort_direction_lookup() {
        let mut view = ViewState::new(5);
        assert_eq!(view.sort_direction("cost"), None);
        view.sort = Some(SortSpec::ascending("cost"));
        assert_eq!(view.sort_direction("cost"), Some(SortDirection::Ascending));
        assert_eq!(view.sort_direction("name"), None);
    }
}
