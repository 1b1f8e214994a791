use lcr_types::{ConsensusValue, LedgerHeaderRecord, LedgerSeq, TransactionSet};

use crate::error::SinkError;

/// Everything needed to close one ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerCloseData {
    pub ledger_seq: LedgerSeq,
    pub tx_set: TransactionSet,
    pub consensus_value: ConsensusValue,
}

impl LedgerCloseData {
    pub fn new(ledger_seq: LedgerSeq, tx_set: TransactionSet, consensus_value: ConsensusValue) -> Self {
        Self {
            ledger_seq,
            tx_set,
            consensus_value,
        }
    }
}

/// The storage engine that owns ledger state.
///
/// Implementations must satisfy:
/// - `last_closed_ledger` is a read-only snapshot; it never changes state.
/// - `close_ledger` is synchronous and performs exactly one state transition,
///   returning the header of the newly closed ledger including its hash.
/// - A broken state-consistency rule is reported as
///   [`SinkError::InvariantDoesNotHold`], never as another variant.
pub trait LedgerApplicationSink: Send + Sync {
    /// The current last-closed ledger header.
    fn last_closed_ledger(&self) -> Result<LedgerHeaderRecord, SinkError>;

    /// Close the next ledger and return the new last-closed ledger header.
    fn close_ledger(&self, data: &LedgerCloseData) -> Result<LedgerHeaderRecord, SinkError>;
}
