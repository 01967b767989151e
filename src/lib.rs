// src/lib.rs
// Library interface for ct-scan
pub mod cli;
pub mod config;
pub mod ct_log;
pub mod error;
pub mod merkle;
pub mod output;
pub mod progress;
pub mod retry;
pub mod scanner;
pub mod signature;
pub mod state;
pub mod stats;
pub mod types;

pub use error::ScanError;
pub use scanner::{ConsistencyCheck, EntryProcessor, Scanner, ScannerConfig};
pub use types::LogEntry;
