//! Stream-based row source.
//!
//! Reads newline-delimited JSON payloads from an async byte stream (usually a
//! TCP connection). Each line is one complete row set.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use super::payload::{parse_rows, RowSet};
use super::RowSource;

type ErrorSlot = Arc<Mutex<Option<String>>>;

fn set_error(slot: &ErrorSlot, error: Option<String>) {
    if let Ok(mut guard) = slot.lock() {
        *guard = error;
    }
}

/// Row sets arriving over an async stream, decoded by a background task.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use asset_table::StreamSource;
///
/// # tokio_test::block_on(async {
/// let stream = Cursor::new(b"[]\n".to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<RowSet>,
    description: String,
    shared_error: ErrorSlot,
    /// Copy of `shared_error` taken on each poll, so `error()` can lend it.
    last_error: Option<String>,
}

impl StreamSource {
    /// Spawn a task reading newline-delimited payloads from `reader`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let shared_error: ErrorSlot = Arc::new(Mutex::new(None));
        let slot = shared_error.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        set_error(&slot, Some("Connection closed".to_string()));
                        break;
                    }
                    Ok(_) if line.trim().is_empty() => {}
                    Ok(_) => match parse_rows(line.trim().as_bytes()) {
                        Ok(rows) => {
                            set_error(&slot, None);
                            if tx.send(rows).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping malformed row payload");
                            set_error(&slot, Some(format!("Parse error: {}", e)));
                        }
                    },
                    Err(e) => {
                        set_error(&slot, Some(format!("Read error: {}", e)));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            shared_error,
            last_error: None,
        }
    }

    /// Decode payloads pushed as raw bytes, e.g. from a message consumer.
    pub fn from_bytes_channel(mut rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        let (tx, rows_rx) = mpsc::channel(16);
        let shared_error: ErrorSlot = Arc::new(Mutex::new(None));
        let slot = shared_error.clone();

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                match parse_rows(&bytes) {
                    Ok(rows) => {
                        set_error(&slot, None);
                        if tx.send(rows).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => set_error(&slot, Some(format!("Parse error: {}", e))),
                }
            }
        });

        Self {
            receiver: rows_rx,
            description: format!("stream: {}", description),
            shared_error,
            last_error: None,
        }
    }
}

impl RowSource for StreamSource {
    fn poll(&mut self) -> Option<RowSet> {
        let received = match self.receiver.try_recv() {
            Ok(rows) => Some(rows),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                if let Ok(mut guard) = self.shared_error.lock() {
                    guard.get_or_insert_with(|| "Stream disconnected".to_string());
                }
                None
            }
        };
        self.last_error = self.shared_error.lock().ok().and_then(|guard| guard.clone());
        received
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_json() -> &'static str {
        r#"{"rows":[{"ticket":"T-1","status":"Open"},{"ticket":"T-2","status":"Closed"}]}"#
    }

    #[tokio::test]
    async fn test_stream_source_spawn() {
        let data = format!("{}\n", sample_json());
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let rows = source.poll().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["ticket"], "T-2");
    }

    #[tokio::test]
    async fn test_stream_source_multiple_payloads() {
        let data = format!("{}\n\n[]\n", sample_json());
        let mut source = StreamSource::spawn(Cursor::new(data), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert_eq!(source.poll().map(|r| r.len()), Some(2));
        assert_eq!(source.poll().map(|r| r.len()), Some(0));
        assert!(source.poll().is_none());
        assert_eq!(source.error(), Some("Connection closed"));
    }

    #[tokio::test]
    async fn test_stream_source_description() {
        let source = StreamSource::spawn(Cursor::new(""), "tcp://localhost:9090");
        assert_eq!(source.description(), "stream: tcp://localhost:9090");
    }

    #[tokio::test]
    async fn test_stream_source_from_bytes_channel() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
        let mut source = StreamSource::from_bytes_channel(rx, "test-channel");

        tx.send(b"not json".to_vec()).await.unwrap();
        tx.send(sample_json().as_bytes().to_vec()).await.unwrap();

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert_eq!(source.poll().map(|r| r.len()), Some(2));
        assert!(source.error().is_none());
    }

    #[tokio::test]
    async fn test_stream_source_invalid_json() {
        let mut source = StreamSource::spawn(Cursor::new("not valid json\n"), "test");

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        assert!(source.poll().is_none());
        assert!(source.error().is_some());
    }
}
