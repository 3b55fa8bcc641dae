//! Row data as seen by the table engine.
//!
//! ## Submodules
//!
//! - [`record`]: the [`Record`] trait rows implement, JSON rows, and [`RowId`]
//! - [`value`]: [`CellValue`], the unit of search, filtering, and sorting
//!
//! ## Data Flow
//!
//! ```text
//! backend JSON ──▶ JsonRow ──Record::cell()──▶ CellValue
//!                                                 │
//!                         search / filter / sort ◀┘
//! ```

pub mod record;
pub mod value;

pub use record::{JsonRow, Record, RowId};
pub use value::CellValue;
