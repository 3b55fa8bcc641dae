//! Export of the visible row set.

use std::borrow::Cow;
use std::path::Path;

use serde_json::{Map, Value};

use super::column::Column;
use crate::data::Record;
use crate::error::TableError;

/// Output format for [`export_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Header row plus rendered cell text.
    Csv,
    /// Array of objects keyed by column key, with typed cell values.
    Json,
}

impl ExportFormat {
    /// Pick a format from a file extension (`.csv` or `.json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Serialize `rows` using `columns`, in the given column order.
pub fn export_rows<'a, R, I>(
    columns: &[&Column<R>],
    rows: I,
    format: ExportFormat,
) -> Result<String, TableError>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    match format {
        ExportFormat::Csv => Ok(to_csv(columns, rows)),
        ExportFormat::Json => to_json(columns, rows),
    }
}

fn to_csv<'a, R, I>(columns: &[&Column<R>], rows: I) -> String
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut out = String::new();
    push_csv_line(&mut out, columns.iter().map(|c| c.header.clone()));
    for row in rows {
        push_csv_line(&mut out, columns.iter().map(|c| c.display(row)));
    }
    out
}

fn push_csv_line(out: &mut String, fields: impl Iterator<Item = String>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(&field));
    }
    out.push_str("\r\n");
}

/// Quote a field when it contains a delimiter, quote, or line break.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn to_json<'a, R, I>(columns: &[&Column<R>], rows: I) -> Result<String, TableError>
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let records: Vec<Value> = rows
        .into_iter()
        .map(|row| {
            let object: Map<String, Value> = columns
                .iter()
                .map(|c| (c.key.clone(), c.value(row).to_json()))
                .collect();
            Value::Object(object)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::render::CellRenderer;
    use serde_json::json;

    fn columns() -> Vec<Column<Value>> {
        vec![
            Column::new("name", "Asset, name"),
            Column::new("cost", "Cost").renderer(CellRenderer::Number { decimals: 2 }),
        ]
    }

    #[test]
    fn test_csv_quotes_and_renders() {
        let cols = columns();
        let refs: Vec<&Column<Value>> = cols.iter().collect();
        let rows = vec![json!({"name": "Pump \"A\"", "cost": 10}), json!({"name": "Desk"})];
        let csv = export_rows(&refs, &rows, ExportFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "\"Asset, name\",Cost\r\n\"Pump \"\"A\"\"\",10.00\r\nDesk,\r\n"
        );
    }

    #[test]
    fn test_json_keeps_column_order() {
        let cols = columns();
        let refs: Vec<&Column<Value>> = cols.iter().rev().collect();
        let rows = vec![json!({"name": "Desk", "cost": 99.5, "ignored": 1})];
        let out = export_rows(&refs, &rows, ExportFormat::Json).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        let keys: Vec<&String> = parsed[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["cost", "name"]);
        assert_eq!(parsed[0]["cost"], json!(99.5));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.CSV")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("out.json")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(Path::new("out.xlsx")), None);
    }
}
