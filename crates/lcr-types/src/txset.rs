use serde::{Deserialize, Serialize};

use crate::hash::Hash256;
use crate::ledger::LedgerSeq;

/// An opaque transaction envelope.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub envelope: Vec<u8>,
}

impl Transaction {
    pub fn new(envelope: impl Into<Vec<u8>>) -> Self {
        Self {
            envelope: envelope.into(),
        }
    }
}

/// The ordered transactions closed into one ledger, anchored to the hash of
/// the ledger they build on.
///
/// An empty set is still anchored: two empty sets on top of different
/// ledgers have different contents hashes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSet {
    pub previous_ledger_hash: Hash256,
    pub transactions: Vec<Transaction>,
}

impl TransactionSet {
    pub fn new(previous_ledger_hash: Hash256, transactions: Vec<Transaction>) -> Self {
        Self {
            previous_ledger_hash,
            transactions,
        }
    }

    /// The canonical empty set on top of `previous_ledger_hash`.
    pub fn empty(previous_ledger_hash: Hash256) -> Self {
        Self::new(previous_ledger_hash, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// An archived transaction set. Only ledgers with a non-empty set have one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSetRecord {
    pub ledger_seq: LedgerSeq,
    pub tx_set: TransactionSet,
}

impl TransactionSetRecord {
    pub fn new(ledger_seq: LedgerSeq, tx_set: TransactionSet) -> Self {
        Self { ledger_seq, tx_set }
    }
}
