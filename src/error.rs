//! Error types for the table engine.

use thiserror::Error;

/// Errors raised by the table engine.
///
/// Configuration mistakes (duplicate keys, a zero page size) are reported
/// here. Malformed persisted layouts and empty data sets are never errors.
#[derive(Debug, Error)]
pub enum TableError {
    /// Two columns were registered with the same key.
    #[error("duplicate column key: {0}")]
    DuplicateColumnKey(String),

    /// A table needs at least one column.
    #[error("a table needs at least one column")]
    NoColumns,

    /// Page size must be greater than zero.
    #[error("page size must be greater than zero")]
    InvalidPageSize,

    /// A control referenced a column that is not registered.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Export is disabled for this table or the caller lacks permission.
    #[error("export is not permitted for this table")]
    ExportNotPermitted,

    /// Serializing exported rows failed.
    #[error("failed to serialize export: {0}")]
    Export(#[from] serde_json::Error),
}

/// Errors from a [`ViewStore`](crate::table::persist::ViewStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be encoded.
    #[error("failed to encode stored state: {0}")]
    Serialize(#[from] serde_json::Error),
}
