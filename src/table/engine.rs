//! View computation.
//!
//! Derives the visible page from `(rows, view state)` without touching
//! either. The pipeline always runs in the same order:
//!
//! ```text
//! rows ──▶ search ──▶ filters ──▶ sort ──▶ paginate ──▶ ViewPage
//!                                   │
//!                        total_count┘ (before pagination)
//! ```

use std::cmp::Ordering;

use super::column::{Column, ColumnModel};
use super::view::{Filter, SortDirection, ViewState};
use crate::data::{CellValue, Record};
use crate::error::TableError;

/// One computed page of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPage {
    /// Indices into the row set, in display order.
    pub rows: Vec<usize>,
    /// Rows matching search and filters, across all pages.
    pub total_count: usize,
    /// Effective 1-based page after clamping.
    pub page: usize,
    /// Always at least 1.
    pub page_count: usize,
}

impl ViewPage {
    /// An empty first page.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            total_count: 0,
            page: 1,
            page_count: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Compute the page of rows described by `view`.
///
/// A zero page size is rejected; a page past the end clamps to the last page.
pub fn compute_view<R: Record>(
    model: &ColumnModel<R>,
    rows: &[R],
    view: &ViewState,
) -> Result<ViewPage, TableError> {
    if view.page_size == 0 {
        return Err(TableError::InvalidPageSize);
    }
    let matched = filter_and_sort(model, rows, view);
    Ok(paginate(matched, view.current_page, view.page_size))
}

/// Search, filter, and sort; no pagination.
pub fn filter_and_sort<R: Record>(
    model: &ColumnModel<R>,
    rows: &[R],
    view: &ViewState,
) -> Vec<usize> {
    let needle = view.search_term.trim().to_lowercase();
    let searchable: Vec<&Column<R>> = if needle.is_empty() {
        Vec::new()
    } else {
        model.visible(view).into_iter().filter(|c| c.searchable).collect()
    };
    let filters: Vec<(&Column<R>, &Filter)> = view
        .filters
        .iter()
        .filter_map(|(key, filter)| model.get(key).map(|column| (column, filter)))
        .collect();

    let mut matched: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            needle.is_empty() || searchable.iter().any(|c| c.value(*row).contains_lowercase(&needle))
        })
        .filter(|(_, row)| filters.iter().all(|(column, filter)| column.matches_filter(*row, filter)))
        .map(|(i, _)| i)
        .collect();

    if let Some(sort) = &view.sort {
        if let Some(column) = model.get(&sort.column) {
            sort_indices(&mut matched, rows, column, sort.direction);
        }
    }

    matched
}

/// Stable sort of row indices by one column. Ties keep their original order
/// in both directions.
fn sort_indices<R: Record>(
    indices: &mut Vec<usize>,
    rows: &[R],
    column: &Column<R>,
    direction: SortDirection,
) {
    let mut keyed: Vec<(usize, CellValue)> =
        indices.iter().map(|&i| (i, column.value(&rows[i]))).collect();

    keyed.sort_by(|(ia, a), (ib, b)| {
        let primary = a.compare(b);
        let primary = match direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        if primary == Ordering::Equal {
            ia.cmp(ib)
        } else {
            primary
        }
    });

    *indices = keyed.into_iter().map(|(i, _)| i).collect();
}

/// Slice one page out of the matched rows, clamping the requested page.
pub fn paginate(matched: Vec<usize>, page: usize, page_size: usize) -> ViewPage {
    let page_size = page_size.max(1);
    let total_count = matched.len();
    let page_count = total_count.div_ceil(page_size).max(1);
    let page = page.clamp(1, page_count);

    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_count);
    let rows = matched.get(start..end).map(<[usize]>::to_vec).unwrap_or_default();

    ViewPage {
        rows,
        total_count,
        page,
        page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column::Column;
    use crate::table::view::SortSpec;
    use serde_json::{json, Value};

    fn model() -> ColumnModel<Value> {
        ColumnModel::register(vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("cost", "Cost"),
            Column::new("status", "Status"),
        ])
        .unwrap()
    }

    fn assets() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "Laptop", "cost": 900, "status": "Active"}),
            json!({"id": 2, "name": "Forklift", "cost": 15000, "status": "Retired"}),
            json!({"id": 3, "name": "Printer", "cost": 300, "status": "Active"}),
            json!({"id": 4, "name": "Generator", "cost": 900, "status": "Active"}),
            json!({"id": 5, "name": "Projector", "cost": null, "status": "Repair"}),
        ]
    }

    fn ids(rows: &[Value], indices: &[usize]) -> Vec<i64> {
        indices.iter().map(|&i| rows[i]["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn test_search_example() {
        let model = ColumnModel::register(vec![
            Column::<Value>::new("id", "ID"),
            Column::new("name", "Name"),
        ])
        .unwrap();
        let rows = vec![json!({"id": 1, "name": "Alice"}), json!({"id": 2, "name": "Bob"})];
        let mut view = model.default_view(10);
        view.search_term = "ali".into();

        let page = compute_view(&model, &rows, &view).unwrap();
        assert_eq!(page.rows, vec![0]);
        assert_eq!(page.total_count, 1);
        assert_eq!(rows[page.rows[0]], json!({"id": 1, "name": "Alice"}));
    }

    #[test]
    fn test_search_ignores_hidden_and_unsearchable_columns() {
        let model = ColumnModel::register(vec![
            Column::<Value>::new("name", "Name"),
            Column::new("status", "Status").searchable(false),
            Column::new("note", "Note").hidden(),
        ])
        .unwrap();
        let rows = vec![
            json!({"name": "Laptop", "status": "Active", "note": "spare"}),
            json!({"name": "Spare parts", "status": "Active", "note": ""}),
        ];
        let mut view = model.default_view(10);

        view.search_term = "active".into();
        assert_eq!(compute_view(&model, &rows, &view).unwrap().total_count, 0);

        view.search_term = "SPARE".into();
        assert_eq!(compute_view(&model, &rows, &view).unwrap().rows, vec![1]);
    }

    #[test]
    fn test_unique_substring_gives_one_result() {
        let model = model();
        let rows = assets();
        let mut view = model.default_view(10);
        view.search_term = "forkl".into();
        assert_eq!(compute_view(&model, &rows, &view).unwrap().total_count, 1);
    }

    #[test]
    fn test_filters_are_and_combined() {
        let model = model();
        let rows = assets();
        let mut view = model.default_view(10);
        view.filters.insert("status".into(), Filter::Equals("Active".into()));
        view.filters.insert("cost".into(), Filter::Equals(CellValue::Number(900.0)));

        let page = compute_view(&model, &rows, &view).unwrap();
        assert_eq!(ids(&rows, &page.rows), vec![1, 4]);
        assert_eq!(page.total_count, 2);
    }

    #[test]
    fn test_filter_on_unknown_column_is_ignored() {
        let model = model();
        let rows = assets();
        let mut view = model.default_view(10);
        view.filters.insert("ghost".into(), Filter::NotEmpty);
        assert_eq!(compute_view(&model, &rows, &view).unwrap().total_count, 5);
    }

    #[test]
    fn test_sort_numeric_with_stable_ties() {
        let model = model();
        let rows = assets();
        let mut view = model.default_view(10);

        view.sort = Some(SortSpec::ascending("cost"));
        let asc = filter_and_sort(&model, &rows, &view);
        assert_eq!(ids(&rows, &asc), vec![3, 1, 4, 2, 5]);

        view.sort = Some(SortSpec::descending("cost"));
        let desc = filter_and_sort(&model, &rows, &view);
        // Empty sorts last ascending, so first descending; ties keep input order.
        assert_eq!(ids(&rows, &desc), vec![5, 2, 1, 4, 3]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let model = model();
        let rows = assets();
        let mut view = model.default_view(10);
        view.sort = Some(SortSpec::ascending("name"));

        let once = filter_and_sort(&model, &rows, &view);
        let sorted_rows: Vec<Value> = once.iter().map(|&i| rows[i].clone()).collect();
        let twice = filter_and_sort(&model, &sorted_rows, &view);
        assert_eq!(twice, (0..sorted_rows.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_sort_on_mixed_types() {
        let model = ColumnModel::register(vec![Column::<Value>::new("tag", "Tag")]).unwrap();
        let rows = vec![
            json!({"tag": "beta"}),
            json!({"tag": null}),
            json!({"tag": "10"}),
            json!({"tag": true}),
            json!({"tag": 2}),
            json!({"tag": "Alpha"}),
        ];
        let mut view = model.default_view(10);
        view.sort = Some(SortSpec::ascending("tag"));
        assert_eq!(filter_and_sort(&model, &rows, &view), vec![4, 2, 3, 5, 0, 1]);
    }

    #[test]
    fn test_pagination_clamps_to_last_page() {
        let model = model();
        let rows = assets();
        let mut view = model.default_view(2);
        view.current_page = 3;
        let page = compute_view(&model, &rows, &view).unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.page_count, 3);
        assert_eq!(ids(&rows, &page.rows), vec![5]);

        view.current_page = 9;
        let page = compute_view(&model, &rows, &view).unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(ids(&rows, &page.rows), vec![5]);

        view.current_page = 0;
        assert_eq!(compute_view(&model, &rows, &view).unwrap().page, 1);
    }

    #[test]
    fn test_pages_cover_filtered_rows() {
        let model = model();
        let rows: Vec<Value> = (0..23)
            .map(|i| json!({"id": i, "name": format!("asset {}", i), "cost": i * 10}))
            .collect();
        let mut view = model.default_view(1);
        view.filters.insert("cost".into(), Filter::Range { min: Some(30.0), max: None });
        let filtered = filter_and_sort(&model, &rows, &view).len();

        for page_size in 1..=25 {
            view.page_size = page_size;
            view.current_page = 1;
            let first = compute_view(&model, &rows, &view).unwrap();
            let mut seen = 0;
            for page in 1..=first.page_count {
                view.current_page = page;
                let p = compute_view(&model, &rows, &view).unwrap();
                assert_eq!(p.total_count, filtered);
                seen += p.rows.len();
            }
            assert_eq!(seen, filtered, "page size {}", page_size);
        }
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let model = model();
        let view = model.default_view(0);
        assert!(matches!(
            compute_view(&model, &assets(), &view),
            Err(TableError::InvalidPageSize)
        ));
    }

    #[test]
    fn test_empty_rows() {
        let model = model();
        let view = model.default_view(10);
        let page = compute_view(&model, &[], &view).unwrap();
        assert_eq!(page, ViewPage::empty());
        assert!(!page.has_next() && !page.has_prev());
    }
}
