use lcr_types::LedgerHeaderRecord;

use crate::error::ReplayError;

/// Non-fatal outcomes of checking an archived header against the LCL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Continuity {
    /// More than one ledger before the LCL; nothing to check.
    TooOld,
    /// Exactly one before the LCL and hashes to the LCL's predecessor.
    KnitsUpBeforeLcl,
    /// At the LCL and hashes to it.
    KnitsUpAtLcl,
    /// The ledger right after the LCL, built on it. Apply it.
    ValidNext,
}

impl Continuity {
    /// Returns `true` if the header must be applied.
    pub fn should_apply(&self) -> bool {
        matches!(self, Self::ValidNext)
    }
}

/// Classifies archived headers against the last-closed ledger.
pub struct ContinuityValidator;

impl ContinuityValidator {
    /// Classify `header` against `lcl`.
    ///
    /// The checks run in a fixed order and the first match wins, so a header
    /// for an earlier ledger is never mistaken for an overshoot.
    ///
    /// The too-old cutoff is fixed at one ledger before the LCL and is not
    /// configurable: the two knit-up checks own `lcl - 1` and `lcl`, so any
    /// other cutoff would either skip a hash check or leave a sequence
    /// unclassified.
    pub fn classify(
        header: &LedgerHeaderRecord,
        lcl: &LedgerHeaderRecord,
    ) -> Result<Continuity, ReplayError> {
        let seq = u64::from(header.sequence());
        let lcl_seq = u64::from(lcl.sequence());

        if seq + 1 < lcl_seq {
            return Ok(Continuity::TooOld);
        }

        if seq + 1 == lcl_seq {
            if header.hash != lcl.previous_hash() {
                return Err(ReplayError::PredecessorMismatch {
                    seq: header.sequence(),
                    hash: header.hash,
                    predecessor_hash: lcl.previous_hash(),
                });
            }
            return Ok(Continuity::KnitsUpBeforeLcl);
        }

        if seq == lcl_seq {
            if header.hash != lcl.hash {
                return Err(ReplayError::LclHashMismatch {
                    seq: header.sequence(),
                    hash: header.hash,
                    lcl_hash: lcl.hash,
                });
            }
            return Ok(Continuity::KnitsUpAtLcl);
        }

        if seq != lcl_seq + 1 {
            return Err(ReplayError::Overshoot {
                actual: header.sequence(),
                expected: lcl.sequence().saturating_add(1),
            });
        }

        if header.previous_hash() != lcl.hash {
            return Err(ReplayError::ChainBreak {
                lcl_seq: lcl.sequence(),
                previous_hash: header.previous_hash(),
                lcl_hash: lcl.hash,
            });
        }

        Ok(Continuity::ValidNext)
    }
}

#[cfg(test)]
mod tests {
    use lcr_types::{Hash256, LedgerHeader};

    use super::*;

    fn header(seq: u32, hash: &[u8], prev: &[u8]) -> LedgerHeaderRecord {
        LedgerHeaderRecord::new(
            Hash256::digest(hash),
            LedgerHeader {
                ledger_seq: seq,
                previous_ledger_hash: Hash256::digest(prev),
                ..Default::default()
            },
        )
    }

    fn lcl() -> LedgerHeaderRecord {
        header(10, b"h10", b"h9")
    }

    #[test]
    fn too_old_is_skipped_without_hash_check() {
        let result = ContinuityValidator::classify(&header(8, b"whatever", b"x"), &lcl());
        assert_eq!(result.unwrap(), Continuity::TooOld);
        let result = ContinuityValidator::classify(&header(1, b"genesis", b"x"), &lcl());
        assert_eq!(result.unwrap(), Continuity::TooOld);
    }

    #[test]
    fn one_before_lcl_knits_up() {
        let result = ContinuityValidator::classify(&header(9, b"h9", b"h8"), &lcl());
        assert_eq!(result.unwrap(), Continuity::KnitsUpBeforeLcl);
    }

    #[test]
    fn one_before_lcl_with_wrong_hash_fails() {
        let err = ContinuityValidator::classify(&header(9, b"fork9", b"h8"), &lcl()).unwrap_err();
        assert!(matches!(err, ReplayError::PredecessorMismatch { seq: 9, .. }));
        assert!(err.to_string().contains("failed to connect on hash of LCL predecessor"));
    }

    #[test]
    fn at_lcl_knits_up() {
        let result = ContinuityValidator::classify(&header(10, b"h10", b"h9"), &lcl()).unwrap();
        assert_eq!(result, Continuity::KnitsUpAtLcl);
        assert!(!result.should_apply());
    }

    #[test]
    fn at_lcl_with_wrong_hash_fails() {
        let err = ContinuityValidator::classify(&header(10, b"fork10", b"h9"), &lcl()).unwrap_err();
        assert!(matches!(err, ReplayError::LclHashMismatch { seq: 10, .. }));
    }

    #[test]
    fn valid_next_is_applied() {
        let result = ContinuityValidator::classify(&header(11, b"h11", b"h10"), &lcl()).unwrap();
        assert_eq!(result, Continuity::ValidNext);
        assert!(result.should_apply());
    }

    #[test]
    fn overshoot_fails() {
        let err = ContinuityValidator::classify(&header(12, b"h12", b"h11"), &lcl()).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Overshoot {
                actual: 12,
                expected: 11
            }
        ));
    }

    #[test]
    fn chain_break_fails() {
        let err = ContinuityValidator::classify(&header(11, b"h11", b"fork10"), &lcl()).unwrap_err();
        match err {
            ReplayError::ChainBreak {
                lcl_seq,
                previous_hash,
                lcl_hash,
            } => {
                assert_eq!(lcl_seq, 10);
                assert_eq!(previous_hash, Hash256::digest(b"fork10"));
                assert_eq!(lcl_hash, Hash256::digest(b"h10"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn genesis_lcl_accepts_ledger_two() {
        let genesis = header(1, b"h1", b"zero");
        let result = ContinuityValidator::classify(&header(2, b"h2", b"h1"), &genesis).unwrap();
        assert_eq!(result, Continuity::ValidNext);
        let result = ContinuityValidator::classify(&header(1, b"h1", b"zero"), &genesis).unwrap();
        assert_eq!(result, Continuity::KnitsUpAtLcl);
    }
}
