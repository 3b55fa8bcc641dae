//! # asset-table
//!
//! A reusable data-table engine for asset-management records, plus a
//! terminal viewer built on it.
//!
//! The engine ([`DataTable`]) owns the column model and the per-table view
//! state: search, column filters, a single sort column, pagination, column
//! visibility, order and pinning, and row selection. Every change recomputes
//! the visible row set. Row, header, and bulk actions are gated by
//! [`Permissions`]; the engine hands rows to caller callbacks and never
//! performs the work itself. Layouts persist per storage key through a
//! [`ViewStore`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│  table   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │ (engine) │    │(render) │    │          │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌─────────┐                                                 │
//! │  │ source  │◀── FileSource | StreamSource | ChannelSource    │
//! │  │ (rows)  │                                                 │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`table`]**: the engine, column model, renderers, export and layout persistence
//! - **[`data`]**: records, typed cell values, and row identity
//! - **[`source`]**: row sources ([`RowSource`] trait) for files, streams, and channels
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the terminal viewer
//! - **[`settings`]**: layered configuration for the viewer
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Browse a JSON file of records
//! asset-table --file assets.json
//!
//! # Follow newline-delimited JSON row sets over TCP
//! asset-table --connect localhost:9090
//!
//! # Export the rows to CSV and exit
//! asset-table --file assets.json --export assets.csv
//! ```
//!
//! ### As a library
//!
//! ```
//! use asset_table::{Column, DataTable, Permissions, TableOptions};
//! use serde_json::json;
//!
//! let columns = vec![Column::new("name", "Name"), Column::new("status", "Status")];
//! let rows = vec![
//!     json!({"name": "Laptop", "status": "Active"}),
//!     json!({"name": "Forklift", "status": "Retired"}),
//! ];
//! let options = TableOptions {
//!     permissions: Permissions::read_only(),
//!     ..Default::default()
//! };
//! let mut table = DataTable::new(columns, rows, options).unwrap();
//! table.search_now("fork");
//! assert_eq!(table.page_rows().len(), 1);
//! ```
//!
//! ### Feeding the viewer from a channel
//!
//! ```
//! use asset_table::{App, ChannelSource, TableOptions};
//!
//! let (tx, source) = ChannelSource::create("inventory");
//! let app = App::new(Box::new(source), TableOptions::default());
//! ```
//!
//! ### Bridging from a byte stream
//!
//! ```no_run
//! use asset_table::StreamSource;
//! use tokio::sync::mpsc;
//!
//! # tokio_test::block_on(async {
//! let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
//! let source = StreamSource::from_bytes_channel(rx, "bus");
//! # });
//! ```

pub mod app;
pub mod data;
pub mod error;
pub mod events;
pub mod settings;
pub mod source;
pub mod table;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, TableCommand};
pub use data::{CellValue, JsonRow, Record, RowId};
pub use error::{StoreError, TableError};
pub use settings::{Settings, ThemeMode};
pub use source::{ChannelSource, FileSource, RowSet, RowSource, StreamSource};
pub use table::{
    Column, ColumnDef, DataTable, ExportFormat, FileStore, Filter, MemoryStore, Permissions,
    TableFeatures, TableOptions, ViewState, ViewStore,
};
