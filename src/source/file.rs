//! File-based row source.
//!
//! Polls a JSON file and re-reads it whenever its modification time moves.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::payload::{parse_rows, RowSet};
use super::RowSource;

/// Reads rows from a JSON file, returning them only when the file changed.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<RowSet> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                return None;
            }
        };
        match parse_rows(&bytes) {
            Ok(rows) => {
                self.last_error = None;
                tracing::debug!(path = %self.path.display(), rows = rows.len(), "loaded rows");
                Some(rows)
            }
            Err(e) => {
                self.last_error = Some(format!("Parse error: {}", e));
                None
            }
        }
    }
}

impl RowSource for FileSource {
    fn poll(&mut self) -> Option<RowSet> {
        let current = self.modified_time();
        let changed = match (&self.last_modified, &current) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };

        if !changed {
            return None;
        }
        let rows = self.read_file()?;
        self.last_modified = current;
        Some(rows)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn invalidate(&mut self) -> bool {
        self.last_modified = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{"data": [
            {"asset_code": "FA-0001", "name": "Laptop", "cost": 900},
            {"asset_code": "FA-0002", "name": "Forklift", "cost": 15000}
        ]}"#
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/assets.json");
        assert_eq!(source.path(), Path::new("/tmp/assets.json"));
        assert_eq!(source.description(), "file: /tmp/assets.json");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_poll_reads_once() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());
        let rows = source.poll().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Laptop");

        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_invalidate_rereads() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_some());
        assert!(source.invalidate());
        assert_eq!(source.poll().map(|rows| rows.len()), Some(2));
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/assets.json");
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Parse error"));
    }
}
