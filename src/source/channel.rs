//! Channel-based row source.
//!
//! The embedding application pushes row sets through a tokio watch channel,
//! so only the most recent set is ever delivered.

use tokio::sync::watch;

use super::payload::RowSet;
use super::RowSource;

/// Receives row sets pushed by the embedding application.
///
/// # Example
///
/// ```
/// use asset_table::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("asset-service");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<RowSet>,
    description: String,
    initial_returned: bool,
}

impl ChannelSource {
    pub fn new(receiver: watch::Receiver<RowSet>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            initial_returned: false,
        }
    }

    /// Create a `(sender, source)` pair. The source starts with an empty row set.
    pub fn create(source_description: &str) -> (watch::Sender<RowSet>, Self) {
        let (tx, rx) = watch::channel(RowSet::new());
        (tx, Self::new(rx, source_description))
    }

    fn is_closed(&self) -> bool {
        self.receiver.has_changed().is_err()
    }
}

impl RowSource for ChannelSource {
    fn poll(&mut self) -> Option<RowSet> {
        if !self.initial_returned {
            self.initial_returned = true;
            self.receiver.mark_changed();
        }

        // A value sent just before the sender dropped is still delivered
        if self.receiver.borrow().has_changed() {
            Some(self.receiver.borrow_and_update().clone())
        } else {
            None
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.is_closed().then_some("Channel closed")
    }

    /// Nothing can redeliver once the sender is gone.
    fn invalidate(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.receiver.mark_changed();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_source_poll() {
        let (tx, mut source) = ChannelSource::create("test");

        assert!(source.poll().unwrap().is_empty());
        assert!(source.poll().is_none());

        let row = json!({"asset_code": "FA-0001"}).as_object().cloned().unwrap();
        tx.send(vec![row]).unwrap();

        let rows = source.poll().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["asset_code"], "FA-0001");
        assert_eq!(source.description(), "channel: test");
    }

    #[test]
    fn test_channel_source_invalidate() {
        let (_tx, mut source) = ChannelSource::create("test");
        assert!(source.poll().is_some());
        assert!(source.poll().is_none());
        assert!(source.invalidate());
        assert!(source.poll().is_some());
    }

    #[test]
    fn test_closed_channel_delivers_last_rows_then_reports() {
        let (tx, mut source) = ChannelSource::create("test");
        let row = json!({"asset_code": "FA-0002"}).as_object().cloned().unwrap();
        tx.send(vec![row]).unwrap();
        drop(tx);

        assert_eq!(source.poll().unwrap().len(), 1);
        assert!(source.poll().is_none());
        assert_eq!(source.error(), Some("Channel closed"));
        assert!(!source.invalidate());
    }
}
