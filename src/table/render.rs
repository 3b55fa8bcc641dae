//! Cell renderers.
//!
//! Each column carries one [`CellRenderer`] strategy that turns a
//! [`CellValue`] into display text. Renderers are plain values so they can be
//! swapped per column and tested without drawing anything.

use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::data::CellValue;

/// Signature of a caller-supplied renderer.
pub type RenderFn = Arc<dyn Fn(&CellValue) -> String + Send + Sync>;

/// Strategy used to display a column's cells.
#[derive(Clone, Default)]
pub enum CellRenderer {
    /// The stringified value.
    #[default]
    Text,
    /// Fixed number of decimals.
    Number { decimals: usize },
    /// Thousands-grouped amount prefixed with a currency symbol.
    Currency { symbol: String, decimals: usize },
    /// ISO-8601 dates (or epoch milliseconds) reformatted with a chrono format string.
    Date { format: String },
    /// Fixed labels for truthy and falsy values.
    Boolean { yes: String, no: String },
    /// Maps raw values to labels, e.g. status codes to names.
    Badge(BTreeMap<String, String>),
    /// Caller-supplied formatting.
    Custom(RenderFn),
}

impl fmt::Debug for CellRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRenderer::Text => f.write_str("Text"),
            CellRenderer::Number { decimals } => {
                f.debug_struct("Number").field("decimals", decimals).finish()
            }
            CellRenderer::Currency { symbol, decimals } => f
                .debug_struct("Currency")
                .field("symbol", symbol)
                .field("decimals", decimals)
                .finish(),
            CellRenderer::Date { format } => f.debug_struct("Date").field("format", format).finish(),
            CellRenderer::Boolean { yes, no } => {
                f.debug_struct("Boolean").field("yes", yes).field("no", no).finish()
            }
            CellRenderer::Badge(labels) => f.debug_tuple("Badge").field(labels).finish(),
            CellRenderer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl CellRenderer {
    /// Wrap a closure as a renderer.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&CellValue) -> String + Send + Sync + 'static,
    {
        CellRenderer::Custom(Arc::new(f))
    }

    /// Render a value to display text. Empty values render as an empty string.
    pub fn render(&self, value: &CellValue) -> String {
        if let CellRenderer::Custom(f) = self {
            return f(value);
        }
        if value.is_empty() {
            return String::new();
        }

        match self {
            CellRenderer::Text | CellRenderer::Custom(_) => value.to_string(),
            CellRenderer::Number { decimals } => match value.as_number() {
                Some(n) => format!("{:.*}", *decimals, n),
                None => value.to_string(),
            },
            CellRenderer::Currency { symbol, decimals } => match value.as_number() {
                Some(n) => format_currency(n, symbol, *decimals),
                None => value.to_string(),
            },
            CellRenderer::Date { format } => {
                format_date(value, format).unwrap_or_else(|| value.to_string())
            }
            CellRenderer::Boolean { yes, no } => match truthiness(value) {
                Some(true) => yes.clone(),
                Some(false) => no.clone(),
                None => value.to_string(),
            },
            CellRenderer::Badge(labels) => {
                let raw = value.to_string();
                labels.get(&raw).cloned().unwrap_or(raw)
            }
        }
    }
}

/// Format an amount as `-$1,234.50`.
fn format_currency(amount: f64, symbol: &str, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, amount.abs());
    let (whole, frac) = match fixed.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (fixed.as_str(), None),
    };
    let sign = if amount < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };

    let mut out = format!("{}{}{}", sign, symbol, group_thousands(whole));
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Parse a date-like cell and format it. Returns `None` if nothing parsed or
/// the format string is invalid.
fn format_date(value: &CellValue, format: &str) -> Option<String> {
    let parsed = match value {
        CellValue::Number(ms) => DateTime::from_timestamp_millis(*ms as i64)?.naive_utc(),
        CellValue::Text(s) => parse_datetime(s.trim())?,
        _ => return None,
    };

    let mut out = String::new();
    write!(out, "{}", parsed.format(format)).ok()?;
    Some(out)
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn truthiness(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Bool(b) => Some(*b),
        CellValue::Number(n) => Some(*n != 0.0),
        CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "active" => Some(true),
            "false" | "no" | "n" | "0" | "inactive" => Some(false),
            _ => None,
        },
        CellValue::Empty => None,
    }
}

/// Serializable renderer configuration, used by column definition files.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RendererSpec {
    Text,
    Number {
        #[serde(default)]
        decimals: usize,
    },
    Currency {
        #[serde(default = "default_symbol")]
        symbol: String,
        #[serde(default = "default_currency_decimals")]
        decimals: usize,
    },
    Date {
        #[serde(default = "default_date_format")]
        format: String,
    },
    Boolean {
        #[serde(default = "default_yes")]
        yes: String,
        #[serde(default = "default_no")]
        no: String,
    },
    Badge {
        #[serde(default)]
        labels: BTreeMap<String, String>,
    },
}

fn default_symbol() -> String {
    "₹".to_string()
}

fn default_currency_decimals() -> usize {
    2
}

fn default_date_format() -> String {
    "%d-%m-%Y".to_string()
}

fn default_yes() -> String {
    "Yes".to_string()
}

fn default_no() -> String {
    "No".to_string()
}

impl From<RendererSpec> for CellRenderer {
    fn from(spec: RendererSpec) -> Self {
        match spec {
            RendererSpec::Text => CellRenderer::Text,
            RendererSpec::Number { decimals } => CellRenderer::Number { decimals },
            RendererSpec::Currency { symbol, decimals } => {
                CellRenderer::Currency { symbol, decimals }
            }
            RendererSpec::Date { format } => CellRenderer::Date { format },
            RendererSpec::Boolean { yes, no } => CellRenderer::Boolean { yes, no },
            RendererSpec::Badge { labels } => CellRenderer::Badge(labels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_renderer() {
        assert_eq!(CellRenderer::Text.render(&CellValue::Number(12.0)), "12");
        assert_eq!(CellRenderer::Text.render(&CellValue::Empty), "");
    }

    #[test]
    fn test_number_renderer() {
        let r = CellRenderer::Number { decimals: 2 };
        assert_eq!(r.render(&CellValue::Number(3.14159)), "3.14");
        assert_eq!(r.render(&CellValue::Text("7".into())), "7.00");
        assert_eq!(r.render(&CellValue::Text("n/a".into())), "n/a");
    }

    #[test]
    fn test_currency_renderer() {
        let r = CellRenderer::Currency {
            symbol: "$".into(),
            decimals: 2,
        };
        assert_eq!(r.render(&CellValue::Number(1234567.5)), "$1,234,567.50");
        assert_eq!(r.render(&CellValue::Number(-950.0)), "-$950.00");
        assert_eq!(r.render(&CellValue::Number(-0.001)), "$0.00");
        assert_eq!(r.render(&CellValue::Number(100.0)), "$100.00");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("123456"), "123,456");
    }

    #[test]
    fn test_date_renderer() {
        let r = CellRenderer::Date {
            format: "%d-%m-%Y".into(),
        };
        assert_eq!(r.render(&CellValue::Text("2024-03-31".into())), "31-03-2024");
        assert_eq!(r.render(&CellValue::Text("2024-03-31T10:15:00Z".into())), "31-03-2024");
        assert_eq!(r.render(&CellValue::Text("2024-03-31 10:15:00".into())), "31-03-2024");
        assert_eq!(r.render(&CellValue::Text("soon".into())), "soon");
        assert_eq!(r.render(&CellValue::Number(0.0)), "01-01-1970");
    }

    #[test]
    fn test_boolean_and_badge_renderers() {
        let b = CellRenderer::Boolean {
            yes: "Active".into(),
            no: "Retired".into(),
        };
        assert_eq!(b.render(&CellValue::Bool(false)), "Retired");
        assert_eq!(b.render(&CellValue::Text("yes".into())), "Active");

        let mut labels = BTreeMap::new();
        labels.insert("1".to_string(), "Open".to_string());
        let badge = CellRenderer::Badge(labels);
        assert_eq!(badge.render(&CellValue::Number(1.0)), "Open");
        assert_eq!(badge.render(&CellValue::Number(2.0)), "2");
    }

    #[test]
    fn test_custom_renderer_sees_empty_values() {
        let r = CellRenderer::custom(|v| if v.is_empty() { "-".into() } else { v.to_string() });
        assert_eq!(r.render(&CellValue::Empty), "-");
        assert_eq!(r.render(&CellValue::Text("x".into())), "x");
    }

    #[test]
    fn test_renderer_spec_from_json() {
        let spec: RendererSpec =
            serde_json::from_str(r#"{"type":"currency","symbol":"$"}"#).unwrap();
        assert_eq!(
            spec,
            RendererSpec::Currency {
                symbol: "$".into(),
                decimals: 2
            }
        );
    }
}
