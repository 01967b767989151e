// src/output/mod.rs
//! Entry processors that print one record per scanned entry
//!
//! Each handler owns its writer behind a mutex so it can be shared by every
//! worker in the pool. Write failures are logged and never abort a scan.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::scanner::EntryProcessor;

pub mod csv;
pub mod human;
pub mod json;

pub use self::csv::CsvOutput;
pub use self::human::HumanOutput;
pub use self::json::JsonOutput;

pub(crate) type SharedWriter = Mutex<Box<dyn Write + Send>>;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Csv,
}

impl OutputFormat {
    /// Build the stdout processor for this format
    pub fn processor(self) -> Arc<dyn EntryProcessor> {
        match self {
            OutputFormat::Human => Arc::new(HumanOutput::new()),
            OutputFormat::Json => Arc::new(JsonOutput::new()),
            OutputFormat::Csv => Arc::new(CsvOutput::new()),
        }
    }
}

/// Lock a writer, recovering it if another worker panicked mid-write
pub(crate) fn lock_writer(writer: &SharedWriter) -> MutexGuard<'_, Box<dyn Write + Send>> {
    writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
