//! Row-set payloads.
//!
//! A payload is either a bare JSON array of objects or an object wrapping the
//! array under one of the usual envelope keys:
//!
//! ```json
//! [{"asset_code": "FA-0001", "cost": 1250.5}]
//! {"data": [{"asset_code": "FA-0001", "cost": 1250.5}], "total": 1}
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::data::JsonRow;

/// A resolved set of rows, as delivered by a source.
pub type RowSet = Vec<JsonRow>;

/// Keys checked, in order, when a payload is an envelope object.
pub const ENVELOPE_KEYS: [&str; 4] = ["data", "rows", "results", "items"];

/// Errors decoding a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an array of rows or an object with a data/rows/results/items array")]
    Shape,

    #[error("row {0} is not an object")]
    NotAnObject(usize),
}

/// Decode a payload from raw bytes.
pub fn parse_rows(bytes: &[u8]) -> Result<RowSet, PayloadError> {
    let value: Value = serde_json::from_slice(bytes)?;
    rows_from_value(value)
}

/// Extract rows from an already decoded payload.
pub fn rows_from_value(value: Value) -> Result<RowSet, PayloadError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut envelope) => ENVELOPE_KEYS
            .iter()
            .find_map(|key| match envelope.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or(PayloadError::Shape)?,
        _ => return Err(PayloadError::Shape),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(PayloadError::NotAnObject(i)),
        })
        .collect()
}
