// src/scanner/fetcher.rs
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ct_log::LogClient;
use crate::error::ScanError;
use crate::merkle::{MerkleTreeBuilder, hash_leaf};
use crate::retry::{RetryPolicy, RetryState};
use crate::types::{FetchRange, LogEntry};

/// Delivers one contiguous range of log entries into the worker channel
pub struct RangeFetcher<'a> {
    client: &'a dyn LogClient,
    retry: &'a RetryPolicy,
    quiet: bool,
}

impl<'a> RangeFetcher<'a> {
    pub fn new(client: &'a dyn LogClient, retry: &'a RetryPolicy, quiet: bool) -> Self {
        Self {
            client,
            retry,
            quiet,
        }
    }

    /// Fetch every entry in `range`, in index order
    ///
    /// Logs may answer with fewer entries than asked for; the remainder is
    /// requested again until `range.start` passes `range.end`. Sending blocks
    /// while the channel is full.
    pub async fn fetch(
        &self,
        mut range: FetchRange,
        entries: &mpsc::Sender<LogEntry>,
        mut tree: Option<&mut MerkleTreeBuilder>,
    ) -> Result<(), ScanError> {
        let mut state = self.retry.begin();

        loop {
            if !self.quiet {
                info!("Fetching entries {} to {}", range.start, range.end);
            }

            let error = match self.client.get_entries(range.start, range.end).await {
                Ok(batch) if batch.is_empty() => anyhow::anyhow!("log returned no entries"),
                Ok(batch) => {
                    state = self.retry.begin();

                    for leaf in batch {
                        if range.is_complete() {
                            debug!("Ignoring entries past index {}", range.end);
                            break;
                        }
                        if let Some(tree) = tree.as_deref_mut() {
                            tree.add(hash_leaf(&leaf.leaf_input));
                        }
                        entries
                            .send(LogEntry::new(range.start, leaf))
                            .await
                            .map_err(|_| ScanError::ChannelClosed)?;
                        range.start += 1;
                    }

                    if range.is_complete() {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => e,
            };

            match self.retry.on_failure(state) {
                RetryState::Backoff { failures, wait } => {
                    if !self.quiet {
                        info!(
                            "Problem fetching entries {} to {} from log (will retry in {:?}, attempt {}/{}): {:#}",
                            range.start,
                            range.end,
                            wait,
                            failures,
                            self.retry.max_attempts(),
                            error
                        );
                    }
                    tokio::time::sleep(wait).await;
                    state = self.retry.after_backoff(RetryState::Backoff { failures, wait });
                }
                exhausted => {
                    warn!(
                        "Problem fetching entries {} to {} from log: {:#}",
                        range.start, range.end, error
                    );
                    return Err(ScanError::FetchExhausted {
                        start: range.start,
                        end: range.end,
                        attempts: exhausted.failures(),
                        source: error,
                    });
                }
            }
        }
    }
}
