use std::cmp::Ordering;
use std::collections::VecDeque;

use lcr_archive::{ArchiveResult, TxSetRecordReader};
use lcr_types::{Hash256, LedgerSeq, TransactionSet, TransactionSetRecord};
use tracing::debug;

/// A forward-only stream of archived transaction set records.
pub trait TxSetSource {
    /// The next record, or `None` once the stream is exhausted.
    fn next_record(&mut self) -> ArchiveResult<Option<TransactionSetRecord>>;
}

impl TxSetSource for TxSetRecordReader {
    fn next_record(&mut self) -> ArchiveResult<Option<TransactionSetRecord>> {
        self.read_one()
    }
}

impl TxSetSource for VecDeque<TransactionSetRecord> {
    fn next_record(&mut self) -> ArchiveResult<Option<TransactionSetRecord>> {
        Ok(self.pop_front())
    }
}

/// Resolves the transaction set of each ledger from a sparse record stream.
///
/// Ledgers with an empty transaction set are never archived, so the stream
/// has gaps. The resolver keeps at most one record of look-ahead and always
/// compares it with the target before reading further: a buffered record
/// for a later ledger means the target is a gap, and the record stays
/// buffered for the ledger it belongs to.
pub struct TxSetResolver<S> {
    source: S,
    buffered: Option<TransactionSetRecord>,
}

impl<S: TxSetSource> TxSetResolver<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffered: None,
        }
    }

    /// The underlying source, e.g. to open a new checkpoint file.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Drop the look-ahead record.
    pub fn clear(&mut self) {
        self.buffered = None;
    }

    /// Sequence of the buffered look-ahead record, if any.
    pub fn buffered_seq(&self) -> Option<LedgerSeq> {
        self.buffered.as_ref().map(|r| r.ledger_seq)
    }

    /// The transaction set for `target`.
    ///
    /// Returns the archived set if there is one, or the empty set anchored to
    /// `lcl_hash` otherwise.
    pub fn resolve(&mut self, target: LedgerSeq, lcl_hash: &Hash256) -> ArchiveResult<TransactionSet> {
        loop {
            if let Some(record) = self.buffered.take() {
                match record.ledger_seq.cmp(&target) {
                    Ordering::Less => {
                        debug!(seq = record.ledger_seq, "skipping txset for ledger");
                    }
                    Ordering::Greater => {
                        self.buffered = Some(record);
                        break;
                    }
                    Ordering::Equal => {
                        debug!(seq = target, "loaded txset for ledger");
                        return Ok(record.tx_set);
                    }
                }
            }
            match self.source.next_record()? {
                Some(record) => self.buffered = Some(record),
                None => break,
            }
        }

        debug!(seq = target, "using empty txset for ledger");
        Ok(TransactionSet::empty(*lcl_hash))
    }
}

#[cfg(test)]
mod tests {
    use lcr_types::Transaction;
    use proptest::prelude::*;

    use super::*;

    fn record(seq: LedgerSeq) -> TransactionSetRecord {
        TransactionSetRecord::new(
            seq,
            TransactionSet::new(
                Hash256::digest(&(seq - 1).to_le_bytes()),
                vec![Transaction::new(seq.to_le_bytes().to_vec())],
            ),
        )
    }

    fn resolver(seqs: &[LedgerSeq]) -> TxSetResolver<VecDeque<TransactionSetRecord>> {
        TxSetResolver::new(seqs.iter().map(|s| record(*s)).collect())
    }

    #[test]
    fn gap_does_not_consume_later_record() {
        let lcl = Hash256::digest(b"lcl");
        let mut resolver = resolver(&[100, 103]);

        assert_eq!(resolver.resolve(100, &lcl).unwrap(), record(100).tx_set);

        let gap = resolver.resolve(101, &lcl).unwrap();
        assert!(gap.is_empty());
        assert_eq!(gap.previous_ledger_hash, lcl);
        assert_eq!(resolver.buffered_seq(), Some(103));

        assert!(resolver.resolve(102, &lcl).unwrap().is_empty());
        assert_eq!(resolver.buffered_seq(), Some(103));

        assert_eq!(resolver.resolve(103, &lcl).unwrap(), record(103).tx_set);
        assert_eq!(resolver.buffered_seq(), None);
    }

    #[test]
    fn record_is_consumed_exactly_once() {
        let lcl = Hash256::digest(b"lcl");
        let mut resolver = resolver(&[103]);
        assert!(!resolver.resolve(103, &lcl).unwrap().is_empty());
        // A second request for the same ledger finds nothing left.
        assert!(resolver.resolve(103, &lcl).unwrap().is_empty());
    }

    #[test]
    fn stale_records_are_skipped() {
        let lcl = Hash256::digest(b"lcl");
        let mut resolver = resolver(&[5, 6, 9]);
        assert_eq!(resolver.resolve(9, &lcl).unwrap(), record(9).tx_set);
        assert_eq!(resolver.buffered_seq(), None);
    }

    #[test]
    fn exhausted_stream_yields_anchored_empty_set() {
        let lcl = Hash256::digest(b"lcl");
        let mut resolver = resolver(&[3]);
        let set = resolver.resolve(4, &lcl).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.previous_ledger_hash, lcl);
        assert_eq!(resolver.buffered_seq(), None);
    }

    #[test]
    fn empty_source_yields_empty_sets() {
        let lcl = Hash256::digest(b"lcl");
        let mut resolver = resolver(&[]);
        assert!(resolver.resolve(1, &lcl).unwrap().is_empty());
        assert!(resolver.resolve(2, &lcl).unwrap().is_empty());
    }

    #[test]
    fn clear_drops_look_ahead() {
        let lcl = Hash256::digest(b"lcl");
        let mut resolver = resolver(&[10, 20]);
        resolver.resolve(5, &lcl).unwrap();
        assert_eq!(resolver.buffered_seq(), Some(10));
        resolver.clear();
        assert_eq!(resolver.buffered_seq(), None);
        assert_eq!(resolver.resolve(20, &lcl).unwrap(), record(20).tx_set);
    }

    proptest! {
        #[test]
        fn every_archived_set_resolves_once_in_order(
            seqs in proptest::collection::btree_set(2u32..200, 0..40)
        ) {
            let seqs: Vec<u32> = seqs.into_iter().collect();
            let lcl = Hash256::digest(b"lcl");
            let mut resolver = resolver(&seqs);
            let mut found = Vec::new();
            for target in 1..=200 {
                let set = resolver.resolve(target, &lcl).unwrap();
                if set.is_empty() {
                    prop_assert!(!seqs.contains(&target));
                    prop_assert_eq!(set.previous_ledger_hash, lcl);
                } else {
                    prop_assert_eq!(&set, &record(target).tx_set);
                    found.push(target);
                }
            }
            prop_assert_eq!(found, seqs);
        }
    }
}
