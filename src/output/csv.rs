// src/output/csv.rs
//! CSV output handler

use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::warn;

use crate::output::{SharedWriter, lock_writer};
use crate::scanner::EntryProcessor;
use crate::types::{EntryRecord, LogEntry};

/// CSV output handler; the header row is written before the first record
pub struct CsvOutput {
    writer: SharedWriter,
    header_written: Mutex<bool>,
}

impl CsvOutput {
    /// Create a new CsvOutput that writes to stdout
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            header_written: Mutex::new(false),
        }
    }

    fn emit(&self, record: &EntryRecord) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer);
        let mut header_written = self
            .header_written
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Rows are serialized under the writer lock so they never interleave
        let mut csv_writer = ::csv::WriterBuilder::new()
            .has_headers(!*header_written)
            .from_writer(&mut **writer);
        csv_writer.serialize(record)?;
        csv_writer.flush()?;
        drop(csv_writer);

        *header_written = true;
        writer.flush()?;
        Ok(())
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryProcessor for CsvOutput {
    async fn process(&self, entry: &LogEntry) {
        if let Err(e) = self.emit(&entry.record()) {
            warn!("Failed to write entry {}: {}", entry.index, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::testing::{SharedBuffer, entry};

    #[tokio::test]
    async fn test_csv_header_written_once() {
        let buffer = SharedBuffer::default();
        let handler = CsvOutput::with_writer(Box::new(buffer.clone()));

        handler.process(&entry(1)).await;
        handler.process(&entry(2)).await;

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "index,timestamp,entry_type,leaf_hash");
        assert!(lines[1].starts_with("1,1700000000123,precert,"));
        assert!(lines[2].starts_with("2,1700000000123,precert,"));
    }

    #[tokio::test]
    async fn test_csv_missing_timestamp_is_empty_field() {
        let buffer = SharedBuffer::default();
        let handler = CsvOutput::with_writer(Box::new(buffer.clone()));

        let mut malformed = entry(9);
        malformed.leaf_input = vec![1, 2, 3];
        handler.process(&malformed).await;

        let output = buffer.contents();
        assert!(output.lines().nth(1).unwrap().starts_with("9,,malformed,"));
    }
}
