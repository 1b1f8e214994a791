//! Ledger application sink for ledger chain replay.
//!
//! The sink is the authority on the last-closed ledger (LCL) and performs the
//! actual state transition for each ledger the replayer decides to apply.
//! This crate provides:
//! - The `LedgerApplicationSink` trait boundary
//! - `LedgerCloseData`, the input of a single ledger close
//! - `InMemoryLedgerSink` for tests, tooling and embedding
//! - The genesis ledger header every chain starts from

pub mod error;
pub mod genesis;
pub mod memory;
pub mod traits;

pub use error::SinkError;
pub use genesis::{genesis_header, GENESIS_LEDGER_SEQ};
pub use memory::{InMemoryLedgerSink, Invariant};
pub use traits::{LedgerApplicationSink, LedgerCloseData};
