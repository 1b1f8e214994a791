use lcr_types::{LedgerHeaderRecord, LedgerSeq};

use crate::hasher::header_hash;

/// Ledger header chain verifier.
///
/// Verifies that a run of archived headers forms a valid hash chain: each
/// header's stored hash is the hash of its contents, sequences are
/// contiguous, and each `previous_ledger_hash` names the header before it.
pub struct HeaderChainVerifier;

impl HeaderChainVerifier {
    /// Verify a contiguous run of headers.
    pub fn verify_chain(headers: &[LedgerHeaderRecord]) -> Result<(), ChainError> {
        let mut prev: Option<&LedgerHeaderRecord> = None;
        for record in headers {
            Self::verify_hash(record)?;
            if let Some(prev) = prev {
                Self::verify_link(prev, record)?;
            }
            prev = Some(record);
        }
        Ok(())
    }

    /// Check that a record's stored hash matches its contents.
    pub fn verify_hash(record: &LedgerHeaderRecord) -> Result<(), ChainError> {
        if header_hash(&record.header) != record.hash {
            return Err(ChainError::HashMismatch {
                seq: record.sequence(),
            });
        }
        Ok(())
    }

    /// Check that `next` directly follows `prev`.
    pub fn verify_link(
        prev: &LedgerHeaderRecord,
        next: &LedgerHeaderRecord,
    ) -> Result<(), ChainError> {
        let expected = prev.sequence() + 1;
        if next.sequence() != expected {
            return Err(ChainError::SequenceGap {
                expected,
                actual: next.sequence(),
            });
        }
        if next.previous_hash() != prev.hash {
            return Err(ChainError::BrokenLink {
                seq: next.sequence(),
            });
        }
        Ok(())
    }
}

/// Errors from header chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("hash mismatch at ledger {seq}: computed hash differs from stored")]
    HashMismatch { seq: LedgerSeq },

    #[error("sequence gap: expected ledger {expected}, got {actual}")]
    SequenceGap { expected: LedgerSeq, actual: LedgerSeq },

    #[error("broken link at ledger {seq}: previous hash does not match")]
    BrokenLink { seq: LedgerSeq },
}
