//! Row sources.
//!
//! The table engine never fetches data itself. A [`RowSource`] delivers
//! resolved row sets to the viewer's event loop, which hands them to the
//! table. Sources cover a polled JSON file, a watch channel fed by the
//! embedding application, and newline-delimited JSON over an async stream.

mod channel;
mod file;
mod payload;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use payload::{parse_rows, rows_from_value, PayloadError, RowSet, ENVELOPE_KEYS};
pub use stream::StreamSource;

use std::fmt::Debug;

/// Something that delivers row sets.
///
/// # Example
///
/// ```
/// use asset_table::{FileSource, RowSource};
///
/// let mut source = FileSource::new("assets.json");
/// if let Some(rows) = source.poll() {
///     println!("Got {} rows", rows.len());
/// }
/// ```
pub trait RowSource: Send + Debug {
    /// Latest row set, if one arrived since the last poll. Never blocks.
    fn poll(&mut self) -> Option<RowSet>;

    /// Human-readable origin, shown in the status bar.
    fn description(&self) -> &str;

    /// Error from the most recent poll, if any.
    fn error(&self) -> Option<&str>;

    /// Ask the source to deliver again on the next poll even if nothing
    /// changed. Returns false for sources that cannot re-read.
    fn invalidate(&mut self) -> bool {
        false
    }
}
