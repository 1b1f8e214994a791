//! Hashing primitives for ledger chain replay.
//!
//! Provides domain-separated BLAKE3 hashing of ledger headers, transaction
//! sets and bucket-list states, and verification of archived header chains.
//!
//! All hashing wraps `blake3`; there is no custom cryptography.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, HeaderChainVerifier};
pub use hasher::{bucket_list_hash, header_hash, tx_set_contents_hash, ContentHasher};
