// src/scanner/mod.rs
//! Full-range log scanning with tree head and consistency verification

use anyhow::Result;
use std::cmp::{Ordering, min};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::ct_log::{CtLogClient, LogClient, SignedTreeHead};
use crate::error::ScanError;
use crate::merkle::{self, ConsistencyProof, MerkleTreeBuilder};
use crate::progress::ProgressIndicator;
use crate::retry::RetryPolicy;
use crate::signature::SthVerifier;
use crate::stats::{ScanStats, ScanSummary};
use crate::types::FetchRange;

pub mod fetcher;
pub mod workers;

pub use fetcher::RangeFetcher;
pub use workers::{EntryProcessor, WorkerPool};

/// Buffer between the fetcher and the workers
pub const ENTRY_CHANNEL_CAPACITY: usize = 100;

/// Configuration for a [`Scanner`]
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Entries requested from the log per batch
    pub batch_size: u64,
    /// Concurrent entry processors
    pub workers: usize,
    /// Suppress progress log lines
    pub quiet: bool,
    /// Show a progress bar while scanning
    pub progress: bool,
    pub retry: RetryPolicy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            workers: 1,
            quiet: false,
            progress: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of comparing two tree heads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyCheck {
    /// Whether the second head is an append-only extension of the first
    pub valid: bool,
    /// Compact range of the first tree, ready to accept the new leaves
    pub tree_builder: Option<MerkleTreeBuilder>,
    pub proof: Option<ConsistencyProof>,
}

/// Scans the entries of one CT log
pub struct Scanner {
    log_url: String,
    client: Arc<dyn LogClient>,
    verifier: Option<Arc<dyn SthVerifier>>,
    config: ScannerConfig,
}

impl Scanner {
    pub fn new(
        log_url: impl Into<String>,
        client: Arc<dyn LogClient>,
        verifier: Option<Arc<dyn SthVerifier>>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            log_url: log_url.into(),
            client,
            verifier,
            config,
        }
    }

    /// Create a scanner talking to `log_url` over HTTP
    pub fn connect(
        log_url: impl Into<String>,
        verifier: Option<Arc<dyn SthVerifier>>,
        config: ScannerConfig,
    ) -> Result<Self> {
        let log_url = log_url.into();
        let client = CtLogClient::new(log_url.clone())?;
        Ok(Self::new(log_url, Arc::new(client), verifier, config))
    }

    pub fn log_url(&self) -> &str {
        &self.log_url
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Fetch the log's current tree head, checking its signature if a key is configured
    pub async fn get_sth(&self) -> Result<SignedTreeHead, ScanError> {
        let sth = self.client.get_sth().await.map_err(ScanError::Sth)?;

        if let Some(verifier) = &self.verifier {
            verifier.verify_sth(&sth)?;
        }

        Ok(sth)
    }

    /// Check that `second` is an append-only extension of `first`
    ///
    /// A shrinking tree is reported as invalid without contacting the log.
    /// Equal sizes use an empty proof without a request, since some logs
    /// reject consistency requests between identical sizes.
    pub async fn check_consistency(
        &self,
        first: &SignedTreeHead,
        second: &SignedTreeHead,
    ) -> Result<ConsistencyCheck, ScanError> {
        let proof = match first.tree_size.cmp(&second.tree_size) {
            Ordering::Greater => {
                return Ok(ConsistencyCheck {
                    valid: false,
                    tree_builder: None,
                    proof: None,
                });
            }
            Ordering::Equal => ConsistencyProof::new(),
            Ordering::Less => self
                .client
                .get_consistency_proof(first.tree_size, second.tree_size)
                .await
                .map_err(|source| ScanError::ConsistencyProof {
                    first: first.tree_size,
                    second: second.tree_size,
                    source,
                })?,
        };

        let (valid, tree_builder) = merkle::verify_consistency_proof(&proof, first, second);

        Ok(ConsistencyCheck {
            valid,
            tree_builder,
            proof: Some(proof),
        })
    }

    /// Deliver every entry in `start_index..end_index` to `processor`
    ///
    /// Entries are fetched in batches by a single fetch stream while the
    /// worker pool processes them. Leaf hashes are added to `tree` in index
    /// order. On a fatal fetch error the workers are still joined before the
    /// error is returned.
    pub async fn scan(
        &self,
        start_index: u64,
        end_index: u64,
        processor: Arc<dyn EntryProcessor>,
        mut tree: Option<&mut MerkleTreeBuilder>,
    ) -> Result<ScanSummary, ScanError> {
        if start_index > end_index {
            return Err(ScanError::InvalidRange {
                start: start_index,
                end: end_index,
            });
        }
        if self.config.batch_size == 0 || self.config.workers == 0 {
            return Err(ScanError::InvalidConfig("batch_size and workers must be at least 1"));
        }

        if !self.config.quiet {
            info!("Starting scan of {} (entries {} to {})...", self.log_url, start_index, end_index);
        }

        let stats = ScanStats::new();
        let (entries_tx, entries_rx) = mpsc::channel(ENTRY_CHANNEL_CAPACITY);
        let pool = WorkerPool::start(self.config.workers, entries_rx, processor, stats.clone());

        let progress = ProgressIndicator::new(
            self.config.progress && !self.config.quiet,
            end_index - start_index,
        );
        let ticker = progress.spawn_ticker(stats.clone(), start_index);

        let fetcher = RangeFetcher::new(self.client.as_ref(), &self.config.retry, self.config.quiet);
        let mut fetched = Ok(());
        let mut start = start_index;
        while start < end_index {
            let end = min(start.saturating_add(self.config.batch_size), end_index) - 1;
            if let Err(e) = fetcher
                .fetch(FetchRange::new(start, end), &entries_tx, tree.as_deref_mut())
                .await
            {
                fetched = Err(e);
                break;
            }
            start = end + 1;
        }

        drop(entries_tx);
        let joined = pool.wait().await;

        if let Some(ticker) = ticker {
            ticker.abort();
        }
        progress.finish();

        match (fetched, joined) {
            (Err(ScanError::ChannelClosed), Err(worker)) => return Err(worker),
            (Err(e), _) | (Ok(()), Err(e)) => return Err(e),
            (Ok(()), Ok(())) => {}
        }

        let summary = stats.summary();
        if !self.config.quiet {
            info!(
                "Completed {} entries in {}",
                summary.processed,
                ScanStats::format_duration(summary.elapsed.as_secs())
            );
        }

        Ok(summary)
    }
}
