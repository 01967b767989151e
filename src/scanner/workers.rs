// src/scanner/workers.rs
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::ScanError;
use crate::stats::ScanStats;
use crate::types::LogEntry;

/// Caller logic run once for every scanned entry
#[async_trait]
pub trait EntryProcessor: Send + Sync {
    async fn process(&self, entry: &LogEntry);
}

#[async_trait]
impl<F> EntryProcessor for F
where
    F: Fn(&LogEntry) + Send + Sync,
{
    async fn process(&self, entry: &LogEntry) {
        (self)(entry)
    }
}

/// Fixed set of tasks draining the shared entry channel
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks that run until `entries` is closed and drained
    pub fn start(
        workers: usize,
        entries: mpsc::Receiver<LogEntry>,
        processor: Arc<dyn EntryProcessor>,
        stats: ScanStats,
    ) -> Self {
        let entries = Arc::new(Mutex::new(entries));

        let handles = (0..workers.max(1))
            .map(|id| {
                let entries = Arc::clone(&entries);
                let processor = Arc::clone(&processor);
                let stats = stats.clone();
                tokio::spawn(process_entries(id, entries, processor, stats))
            })
            .collect();

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Join every worker; reports the first task failure after all have stopped
    pub async fn wait(self) -> Result<(), ScanError> {
        let mut failure = None;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
                failure.get_or_insert(e);
            }
        }

        match failure {
            Some(e) => Err(ScanError::Worker(e)),
            None => Ok(()),
        }
    }
}

async fn process_entries(
    id: usize,
    entries: Arc<Mutex<mpsc::Receiver<LogEntry>>>,
    processor: Arc<dyn EntryProcessor>,
    stats: ScanStats,
) {
    loop {
        // Receiving under the lock hands each entry to exactly one worker
        let next = entries.lock().await.recv().await;
        let Some(entry) = next else {
            break;
        };

        stats.increment_processed();
        processor.process(&entry).await;
    }

    debug!("Worker {} finished", id);
}
