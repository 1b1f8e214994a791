//! Foundation types for ledger chain replay (LCR).
//!
//! This crate provides the value types shared by every other LCR crate: the
//! archive readers, the ledger application sink and the replay engine.
//!
//! # Key Types
//!
//! - [`Hash256`] — 32-byte content hash (ledger hashes, tx set hashes)
//! - [`LedgerRange`] — Inclusive range of ledger sequences to replay
//! - [`LedgerHeader`] / [`LedgerHeaderRecord`] — Archived ledger header and its hash
//! - [`ConsensusValue`] — Per-ledger value agreed by consensus
//! - [`TransactionSet`] / [`TransactionSetRecord`] — Transactions closed into a ledger

pub mod error;
pub mod hash;
pub mod ledger;
pub mod range;
pub mod txset;

pub use error::TypeError;
pub use hash::Hash256;
pub use ledger::{ledger_abbrev, ConsensusValue, LedgerHeader, LedgerHeaderRecord, LedgerSeq};
pub use range::LedgerRange;
pub use txset::{Transaction, TransactionSet, TransactionSetRecord};
