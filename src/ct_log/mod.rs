// src/ct_log/mod.rs
pub mod client;
pub mod types;

pub use client::{CtLogClient, LogClient};
pub use types::{LeafEntry, SignedTreeHead};
