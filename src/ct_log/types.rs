// src/ct_log/types.rs
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::merkle::{ConsistencyProof, HASH_SIZE, MerkleHash};

/// Response from CT log's get-sth endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSthResponse {
    pub tree_size: u64,
    pub timestamp: u64,
    pub sha256_root_hash: String,
    #[serde(default)]
    pub tree_head_signature: String,
}

/// Signed tree head with its base64 fields decoded
///
/// Serializes through the get-sth JSON shape, which is also how verified heads
/// are persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GetSthResponse", into = "GetSthResponse")]
pub struct SignedTreeHead {
    pub tree_size: u64,
    pub timestamp: u64,
    pub root_hash: MerkleHash,
    /// TLS `DigitallySigned` structure over the tree head
    pub signature: Vec<u8>,
}

impl TryFrom<GetSthResponse> for SignedTreeHead {
    type Error = anyhow::Error;

    fn try_from(raw: GetSthResponse) -> Result<Self> {
        let root_hash = decode_hash(&raw.sha256_root_hash).context("Invalid sha256_root_hash")?;
        let signature = STANDARD
            .decode(&raw.tree_head_signature)
            .context("Invalid tree_head_signature base64")?;

        Ok(Self {
            tree_size: raw.tree_size,
            timestamp: raw.timestamp,
            root_hash,
            signature,
        })
    }
}

impl From<SignedTreeHead> for GetSthResponse {
    fn from(sth: SignedTreeHead) -> Self {
        Self {
            tree_size: sth.tree_size,
            timestamp: sth.timestamp,
            sha256_root_hash: STANDARD.encode(sth.root_hash),
            tree_head_signature: STANDARD.encode(&sth.signature),
        }
    }
}

/// Single entry from CT log's get-entries endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLogEntry {
    pub leaf_input: String,  // base64-encoded MerkleTreeLeaf
    pub extra_data: String,  // base64-encoded certificate chain
}

/// Response wrapper for get-entries endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct GetEntriesResponse {
    pub entries: Vec<RawLogEntry>,
}

/// Response from get-sth-consistency endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct GetConsistencyResponse {
    #[serde(default)]
    pub consistency: Vec<String>,
}

impl GetConsistencyResponse {
    pub fn into_proof(self) -> Result<ConsistencyProof> {
        self.consistency
            .iter()
            .enumerate()
            .map(|(i, node)| decode_hash(node).with_context(|| format!("Invalid proof node {}", i)))
            .collect()
    }
}

/// Decoded log entry as returned by the server, before an index is assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    pub leaf_input: Vec<u8>,
    pub extra_data: Vec<u8>,
}

impl TryFrom<RawLogEntry> for LeafEntry {
    type Error = anyhow::Error;

    fn try_from(raw: RawLogEntry) -> Result<Self> {
        Ok(Self {
            leaf_input: STANDARD
                .decode(&raw.leaf_input)
                .context("Invalid leaf_input base64")?,
            extra_data: STANDARD
                .decode(&raw.extra_data)
                .context("Invalid extra_data base64")?,
        })
    }
}

fn decode_hash(encoded: &str) -> Result<MerkleHash> {
    let bytes = STANDARD.decode(encoded).context("Invalid base64")?;
    MerkleHash::try_from(bytes.as_slice()).map_err(|_| {
        anyhow::anyhow!("Expected {} byte hash, got {} bytes", HASH_SIZE, bytes.len())
    })
}
