use std::io;

use lcr_archive::ArchiveError;
use lcr_ledger::SinkError;
use lcr_types::{Hash256, LedgerSeq};

/// Terminal replay errors. Each ends the work with a failure state; none is
/// retried by the replayer.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The header one before the LCL is not the LCL's predecessor.
    #[error(
        "replay of [seq={seq}, hash={}] failed to connect on hash of LCL predecessor [seq={}, hash={}]",
        .hash.abbrev(), .seq, .predecessor_hash.abbrev()
    )]
    PredecessorMismatch {
        seq: LedgerSeq,
        hash: Hash256,
        predecessor_hash: Hash256,
    },

    /// The header at the LCL sequence is not the LCL.
    #[error(
        "replay of [seq={seq}, hash={}] at LCL [seq={seq}, hash={}] disagreed on hash",
        .hash.abbrev(), .lcl_hash.abbrev()
    )]
    LclHashMismatch {
        seq: LedgerSeq,
        hash: Hash256,
        lcl_hash: Hash256,
    },

    /// The header is beyond the ledger after the LCL.
    #[error("replay overshot current ledger: {actual} > {expected}")]
    Overshoot {
        actual: LedgerSeq,
        expected: LedgerSeq,
    },

    /// The next header does not build on the LCL.
    #[error(
        "replay at current ledger [seq={}, hash={}] disagreed on LCL hash [seq={lcl_seq}, hash={}]",
        .lcl_seq, .previous_hash.abbrev(), .lcl_hash.abbrev()
    )]
    ChainBreak {
        lcl_seq: LedgerSeq,
        previous_hash: Hash256,
        lcl_hash: Hash256,
    },

    /// The resolved transaction set is not the one the header names.
    #[error(
        "replay txset hash differs from txset hash in replay ledger: hash for txset for {seq} is {}, expected {}",
        .actual.abbrev(), .expected.abbrev()
    )]
    TxSetHashMismatch {
        seq: LedgerSeq,
        actual: Hash256,
        expected: Hash256,
    },

    /// Applying the ledger produced a different ledger than archived.
    #[error(
        "replay of [seq={seq}, hash={}] produced mismatched ledger hash [seq={produced_seq}, hash={}]",
        .expected.abbrev(), .produced.abbrev()
    )]
    ProducedHashMismatch {
        seq: LedgerSeq,
        expected: Hash256,
        produced_seq: LedgerSeq,
        produced: Hash256,
    },

    /// Archive files are missing, truncated, or unreadable.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// The sink failed for a reason other than a broken invariant.
    #[error("ledger application failed: {0}")]
    Sink(SinkError),

    /// `step()` was called after the work already failed.
    #[error("replay already failed; reset before stepping again")]
    AlreadyFailed,
}

/// Coarse classification of a [`ReplayError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayErrorKind {
    /// Local archive storage is missing or damaged.
    Filesystem,
    /// The archived chain does not connect to, or reproduce, local state.
    Chain,
    /// The ledger application sink failed.
    Sink,
}

impl ReplayError {
    pub fn kind(&self) -> ReplayErrorKind {
        match self {
            Self::Archive(_) => ReplayErrorKind::Filesystem,
            Self::Sink(_) => ReplayErrorKind::Sink,
            _ => ReplayErrorKind::Chain,
        }
    }
}

/// A state-consistency invariant broke while applying a ledger.
///
/// Unlike [`ReplayError`] this is not a failure of the work: the sink's
/// state can no longer be trusted and the process is expected to halt.
#[derive(Debug, thiserror::Error)]
#[error("invariant violated while applying ledger {seq}: {source}")]
pub struct InvariantViolation {
    pub seq: LedgerSeq,
    #[source]
    pub source: SinkError,
}

/// Errors loading or validating a [`ReplayConfig`](crate::ReplayConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Parse(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Errors publishing history.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("ledger close failed: {0}")]
    Sink(#[from] SinkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_messages_carry_abbreviated_hashes() {
        let hash = Hash256::digest(b"header");
        let lcl = Hash256::digest(b"lcl");
        let err = ReplayError::LclHashMismatch {
            seq: 12,
            hash,
            lcl_hash: lcl,
        };
        let text = err.to_string();
        assert!(text.contains("seq=12"));
        assert!(text.contains(&hash.abbrev()));
        assert!(text.contains(&lcl.abbrev()));
        assert!(text.contains("disagreed on hash"));
        assert_eq!(err.kind(), ReplayErrorKind::Chain);
    }

    #[test]
    fn archive_errors_are_filesystem_kind() {
        let err = ReplayError::from(ArchiveError::Missing("ledger/x.rec".into()));
        assert_eq!(err.kind(), ReplayErrorKind::Filesystem);
    }

    #[test]
    fn sink_errors_are_sink_kind() {
        let err = ReplayError::Sink(SinkError::LockPoisoned);
        assert_eq!(err.kind(), ReplayErrorKind::Sink);
    }

    #[test]
    fn overshoot_message() {
        let err = ReplayError::Overshoot {
            actual: 9,
            expected: 7,
        };
        assert_eq!(err.to_string(), "replay overshot current ledger: 9 > 7");
    }
}
