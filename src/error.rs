// src/error.rs
//! Error types returned by the scanner

use thiserror::Error;
use tokio::task::JoinError;

use crate::signature::SignatureError;

/// Errors surfaced by [`crate::scanner::Scanner`] operations
///
/// An inconsistent pair of tree heads is not an error: it is reported through
/// [`crate::scanner::ConsistencyCheck::valid`].
#[derive(Debug, Error)]
pub enum ScanError {
    /// Every attempt to fetch a batch failed; the scan was aborted
    #[error("failed to fetch entries {start} to {end} after {attempts} attempts")]
    FetchExhausted {
        start: u64,
        end: u64,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid scan range: start {start} is past end {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("invalid scanner configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("failed to fetch signed tree head")]
    Sth(#[source] anyhow::Error),

    /// The STH signature did not verify against the configured log key
    #[error("STH signature is invalid")]
    InvalidSignature(#[from] SignatureError),

    #[error("failed to fetch consistency proof between tree sizes {first} and {second}")]
    ConsistencyProof {
        first: u64,
        second: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("entry channel closed before the range was delivered")]
    ChannelClosed,

    #[error("worker task failed")]
    Worker(#[from] JoinError),
}

impl ScanError {
    /// True for errors caused by talking to the log rather than by its content
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScanError::FetchExhausted { .. } | ScanError::Sth(_) | ScanError::ConsistencyProof { .. }
        )
    }
}
