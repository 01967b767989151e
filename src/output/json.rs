// src/output/json.rs
//! JSON Lines (JSONL) output handler

use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::warn;

use crate::output::{SharedWriter, lock_writer};
use crate::scanner::EntryProcessor;
use crate::types::{EntryRecord, LogEntry};

/// Outputs one JSON object per entry (JSONL/NDJSON format)
pub struct JsonOutput {
    writer: SharedWriter,
}

impl JsonOutput {
    /// Create a new JsonOutput that writes to stdout
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn emit(&self, record: &EntryRecord) -> anyhow::Result<()> {
        let json = serde_json::to_string(record)?;

        let mut writer = lock_writer(&self.writer);
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(())
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryProcessor for JsonOutput {
    async fn process(&self, entry: &LogEntry) {
        if let Err(e) = self.emit(&entry.record()) {
            warn!("Failed to write entry {}: {}", entry.index, e);
        }
    }
}
