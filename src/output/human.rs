// src/output/human.rs
//! Human-readable colored terminal output

use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::warn;

use crate::output::{SharedWriter, lock_writer};
use crate::scanner::EntryProcessor;
use crate::types::{EntryRecord, LogEntry};

/// Human-readable output handler with colored terminal output
pub struct HumanOutput {
    writer: SharedWriter,
    use_colors: bool,
}

impl HumanOutput {
    /// Create a new HumanOutput that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Plain output to an arbitrary writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            use_colors: false,
        }
    }

    /// Format a millisecond timestamp as `YYYY-MM-DD HH:MM:SS`
    fn format_timestamp(ts_millis: Option<u64>) -> String {
        use chrono::DateTime;

        let Some(ts) = ts_millis else {
            return "unknown time".to_string();
        };

        match i64::try_from(ts).ok().and_then(DateTime::from_timestamp_millis) {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format!("{}", ts),
        }
    }

    fn emit(&self, record: &EntryRecord) -> anyhow::Result<()> {
        let timestamp = Self::format_timestamp(record.timestamp);
        let mut writer = lock_writer(&self.writer);

        if self.use_colors {
            writeln!(
                writer,
                "{} {} {} {}",
                format!("[{}]", timestamp).dimmed(),
                format!("#{}", record.index).cyan().bold(),
                record.entry_type.yellow(),
                record.leaf_hash.dimmed()
            )?;
        } else {
            writeln!(
                writer,
                "[{}] #{} {} {}",
                timestamp, record.index, record.entry_type, record.leaf_hash
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryProcessor for HumanOutput {
    async fn process(&self, entry: &LogEntry) {
        if let Err(e) = self.emit(&entry.record()) {
            warn!("Failed to write entry {}: {}", entry.index, e);
        }
    }
}
