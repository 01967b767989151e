// src/signature.rs
//! Signed tree head signature verification
//!
//! A tree head signature is a TLS `DigitallySigned` envelope over the RFC 6962
//! `TreeHeadSignature` structure:
//!
//! ```text
//! version(1) signature_type(1) timestamp(8) tree_size(8) sha256_root_hash(32)
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use p256::pkcs8::der::Decode;
use p256::pkcs8::spki::{ObjectIdentifier, SubjectPublicKeyInfoRef};
use thiserror::Error;

use crate::ct_log::types::SignedTreeHead;

const HASH_ALGORITHM_SHA256: u8 = 4;
const SIGNATURE_ALGORITHM_ECDSA: u8 = 3;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

const SCT_VERSION_V1: u8 = 0;
const SIGNATURE_TYPE_TREE_HASH: u8 = 1;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid log public key: {0}")]
    InvalidKey(String),

    #[error("malformed signature: {0}")]
    Malformed(&'static str),

    #[error("unsupported signature algorithm (hash {hash}, signature {signature})")]
    UnsupportedAlgorithm { hash: u8, signature: u8 },

    #[error("signature does not match tree head")]
    Mismatch,
}

/// Checks that a tree head was signed by the log
pub trait SthVerifier: Send + Sync {
    fn verify_sth(&self, sth: &SignedTreeHead) -> Result<(), SignatureError>;
}

/// Verifier for logs with ECDSA P-256 / SHA-256 keys
pub struct EcdsaSthVerifier {
    key: VerifyingKey,
}

impl EcdsaSthVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Parse a DER-encoded SubjectPublicKeyInfo
    ///
    /// RSA log keys are rejected here rather than failing every later check.
    pub fn from_der(der: &[u8]) -> Result<Self, SignatureError> {
        let spki = SubjectPublicKeyInfoRef::from_der(der)
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        if spki.algorithm.oid == RSA_ENCRYPTION {
            return Err(SignatureError::InvalidKey(
                "RSA log keys are not supported, only ECDSA P-256".to_string(),
            ));
        }

        let key = VerifyingKey::from_public_key_der(der)
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        Ok(Self::new(key))
    }

    /// Parse a base64 SubjectPublicKeyInfo, the form used in CT log lists
    pub fn from_base64(encoded: &str) -> Result<Self, SignatureError> {
        let der = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
        Self::from_der(&der)
    }
}

impl SthVerifier for EcdsaSthVerifier {
    fn verify_sth(&self, sth: &SignedTreeHead) -> Result<(), SignatureError> {
        let signed = DigitallySigned::parse(&sth.signature)?;
        if signed.hash != HASH_ALGORITHM_SHA256 || signed.signature != SIGNATURE_ALGORITHM_ECDSA {
            return Err(SignatureError::UnsupportedAlgorithm {
                hash: signed.hash,
                signature: signed.signature,
            });
        }

        let signature = Signature::from_der(signed.value)
            .map_err(|_| SignatureError::Malformed("invalid ECDSA DER signature"))?;

        self.key
            .verify(&tree_head_signature_input(sth), &signature)
            .map_err(|_| SignatureError::Mismatch)
    }
}

/// Bytes covered by a tree head signature
pub fn tree_head_signature_input(sth: &SignedTreeHead) -> Vec<u8> {
    let mut input = Vec::with_capacity(2 + 8 + 8 + sth.root_hash.len());
    input.push(SCT_VERSION_V1);
    input.push(SIGNATURE_TYPE_TREE_HASH);
    input.extend_from_slice(&sth.timestamp.to_be_bytes());
    input.extend_from_slice(&sth.tree_size.to_be_bytes());
    input.extend_from_slice(&sth.root_hash);
    input
}

struct DigitallySigned<'a> {
    hash: u8,
    signature: u8,
    value: &'a [u8],
}

impl<'a> DigitallySigned<'a> {
    fn parse(bytes: &'a [u8]) -> Result<Self, SignatureError> {
        let [hash, signature, hi, lo, value @ ..] = bytes else {
            return Err(SignatureError::Malformed("truncated DigitallySigned header"));
        };
        let len = u16::from_be_bytes([*hi, *lo]) as usize;
        if value.len() != len {
            return Err(SignatureError::Malformed("signature length mismatch"));
        }
        Ok(Self {
            hash: *hash,
            signature: *signature,
            value,
        })
    }
}
