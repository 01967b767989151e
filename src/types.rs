// src/types.rs
use serde::Serialize;
use std::fmt;

use crate::ct_log::types::LeafEntry;
use crate::merkle::{self, MerkleHash};

const MERKLE_LEAF_VERSION_V1: u8 = 0;
const LEAF_TYPE_TIMESTAMPED_ENTRY: u8 = 0;

/// One leaf of the log, tagged with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Position in the log, assigned by the fetcher
    pub index: u64,
    /// `MerkleTreeLeaf` encoding hashed into the tree
    pub leaf_input: Vec<u8>,
    /// Certificate chain supplied alongside the leaf
    pub extra_data: Vec<u8>,
}

impl LogEntry {
    pub fn new(index: u64, leaf: LeafEntry) -> Self {
        Self {
            index,
            leaf_input: leaf.leaf_input,
            extra_data: leaf.extra_data,
        }
    }

    pub fn leaf_hash(&self) -> MerkleHash {
        merkle::hash_leaf(&self.leaf_input)
    }

    /// `TimestampedEntry` header fields, if the leaf is a v1 timestamped entry
    fn header(&self) -> Option<(u64, u16)> {
        let [version, leaf_type, rest @ ..] = self.leaf_input.as_slice() else {
            return None;
        };
        if *version != MERKLE_LEAF_VERSION_V1 || *leaf_type != LEAF_TYPE_TIMESTAMPED_ENTRY {
            return None;
        }
        let timestamp = u64::from_be_bytes(rest.get(..8)?.try_into().ok()?);
        let entry_type = u16::from_be_bytes(rest.get(8..10)?.try_into().ok()?);
        Some((timestamp, entry_type))
    }

    /// Log timestamp in milliseconds since the epoch
    pub fn timestamp(&self) -> Option<u64> {
        self.header().map(|(timestamp, _)| timestamp)
    }

    pub fn entry_type(&self) -> Option<EntryType> {
        self.header().map(|(_, entry_type)| EntryType::from(entry_type))
    }

    /// Flat summary used by the output processors
    pub fn record(&self) -> EntryRecord {
        EntryRecord {
            index: self.index,
            timestamp: self.timestamp(),
            entry_type: self
                .entry_type()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "malformed".to_string()),
            leaf_hash: hex::encode(self.leaf_hash()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    X509,
    Precert,
    Unknown(u16),
}

impl From<u16> for EntryType {
    fn from(value: u16) -> Self {
        match value {
            0 => EntryType::X509,
            1 => EntryType::Precert,
            other => EntryType::Unknown(other),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::X509 => write!(f, "x509"),
            EntryType::Precert => write!(f, "precert"),
            EntryType::Unknown(value) => write!(f, "unknown({})", value),
        }
    }
}

/// Inclusive range of log indices still to be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRange {
    pub start: u64,
    pub end: u64,
}

impl FetchRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// True once every index up to `end` has been delivered
    pub fn is_complete(&self) -> bool {
        self.start > self.end
    }

    pub fn remaining(&self) -> u64 {
        self.end.saturating_add(1).saturating_sub(self.start)
    }
}

/// Serializable per-entry summary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntryRecord {
    pub index: u64,
    pub timestamp: Option<u64>,
    pub entry_type: String,
    pub leaf_hash: String,
}

#[cfg(test)]
pub(crate) fn test_leaf(timestamp: u64, entry_type: u16, body: &[u8]) -> Vec<u8> {
    let mut leaf = vec![MERKLE_LEAF_VERSION_V1, LEAF_TYPE_TIMESTAMPED_ENTRY];
    leaf.extend_from_slice(&timestamp.to_be_bytes());
    leaf.extend_from_slice(&entry_type.to_be_bytes());
    leaf.extend_from_slice(body);
    leaf
}
