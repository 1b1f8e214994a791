use serde::{Deserialize, Serialize};

use crate::hash::Hash256;

/// Ledger sequence number.
pub type LedgerSeq = u32;

/// The value consensus agreed on for a ledger.
///
/// Replay treats it as opaque apart from `tx_set_hash`, which must match the
/// contents hash of the transaction set being applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsensusValue {
    pub tx_set_hash: Hash256,
    pub close_time: u64,
}

/// An archived ledger header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerHeader {
    pub ledger_seq: LedgerSeq,
    pub previous_ledger_hash: Hash256,
    pub bucket_list_hash: Hash256,
    pub consensus_value: ConsensusValue,
}

/// A ledger header together with its hash, as stored in the header stream of
/// a checkpoint and as reported by the ledger application sink.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerHeaderRecord {
    pub hash: Hash256,
    pub header: LedgerHeader,
}

impl LedgerHeaderRecord {
    pub fn new(hash: Hash256, header: LedgerHeader) -> Self {
        Self { hash, header }
    }

    pub fn sequence(&self) -> LedgerSeq {
        self.header.ledger_seq
    }

    pub fn previous_hash(&self) -> Hash256 {
        self.header.previous_ledger_hash
    }

    pub fn bucket_list_hash(&self) -> Hash256 {
        self.header.bucket_list_hash
    }

    pub fn tx_set_hash(&self) -> Hash256 {
        self.header.consensus_value.tx_set_hash
    }

    pub fn consensus_value(&self) -> &ConsensusValue {
        &self.header.consensus_value
    }

    /// Short `[seq=N, hash=abcdef]` form for diagnostics.
    pub fn abbrev(&self) -> String {
        ledger_abbrev(self.sequence(), &self.hash)
    }
}

/// Short `[seq=N, hash=abcdef]` form of a ledger identity.
pub fn ledger_abbrev(seq: LedgerSeq, hash: &Hash256) -> String {
    format!("[seq={seq}, hash={}]", hash.abbrev())
}
