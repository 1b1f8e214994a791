use lcr_types::LedgerSeq;

/// Errors produced by a ledger application sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// A state-consistency rule was broken while closing a ledger. Callers
    /// must not continue on top of the resulting state.
    #[error("invariant {name} does not hold at ledger {seq}: {reason}")]
    InvariantDoesNotHold {
        name: String,
        seq: LedgerSeq,
        reason: String,
    },

    #[error("close attempted out of order: expected ledger {expected}, got {actual}")]
    OutOfOrder { expected: LedgerSeq, actual: LedgerSeq },

    #[error("ledger state lock poisoned")]
    LockPoisoned,

    #[error("ledger close failed: {0}")]
    CloseFailed(String),
}

impl SinkError {
    /// Returns `true` for errors that must halt the node rather than fail
    /// the current piece of work.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantDoesNotHold { .. })
    }
}
