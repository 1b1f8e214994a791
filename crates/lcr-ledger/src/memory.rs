use std::sync::RwLock;

use lcr_crypto::{bucket_list_hash, header_hash, tx_set_contents_hash};
use lcr_types::{Hash256, LedgerHeader, LedgerHeaderRecord};
use tracing::{debug, info};

use crate::error::SinkError;
use crate::genesis::genesis_header;
use crate::traits::{LedgerApplicationSink, LedgerCloseData};

/// A named state-consistency check run before every close.
pub type Invariant = Box<dyn Fn(&LedgerCloseData, &LedgerHeaderRecord) -> Result<(), String> + Send + Sync>;

/// In-memory ledger sink for tests, tooling, and embedding.
///
/// Closing a ledger derives the next header deterministically from the LCL,
/// the transaction set and the consensus value, so a chain closed by one
/// instance replays bit-for-bit on another.
pub struct InMemoryLedgerSink {
    inner: RwLock<SinkState>,
    invariants: Vec<(String, Invariant)>,
}

struct SinkState {
    lcl: LedgerHeaderRecord,
    closed_ledgers: u64,
    next_bucket_list_hash: Option<Hash256>,
}

impl InMemoryLedgerSink {
    /// A sink whose LCL is `lcl`.
    pub fn new(lcl: LedgerHeaderRecord) -> Self {
        Self {
            inner: RwLock::new(SinkState {
                lcl,
                closed_ledgers: 0,
                next_bucket_list_hash: None,
            }),
            invariants: Vec::new(),
        }
    }

    /// A sink positioned at the genesis ledger.
    pub fn from_genesis() -> Self {
        Self::new(genesis_header())
    }

    /// Register an invariant checked before each close. The built-in
    /// "txset anchored to LCL" invariant is always checked first.
    pub fn with_invariant<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&LedgerCloseData, &LedgerHeaderRecord) -> Result<(), String> + Send + Sync + 'static,
    {
        self.invariants.push((name.into(), Box::new(check)));
        self
    }

    /// Number of ledgers closed by this sink.
    pub fn closed_ledger_count(&self) -> Result<u64, SinkError> {
        let state = self.inner.read().map_err(|_| SinkError::LockPoisoned)?;
        Ok(state.closed_ledgers)
    }

    /// Force the bucket-list hash of the next close.
    ///
    /// Test harness seam: lets a harness replay archives produced under
    /// different bucket logic. The override is consumed by the next close.
    pub fn set_next_bucket_list_hash(&self, hash: Hash256) -> Result<(), SinkError> {
        let mut state = self.inner.write().map_err(|_| SinkError::LockPoisoned)?;
        info!(hash = %hash.abbrev(), "forcing bucket list hash for next close");
        state.next_bucket_list_hash = Some(hash);
        Ok(())
    }

    fn check_invariants(
        &self,
        data: &LedgerCloseData,
        lcl: &LedgerHeaderRecord,
    ) -> Result<(), SinkError> {
        if data.tx_set.previous_ledger_hash != lcl.hash {
            return Err(SinkError::InvariantDoesNotHold {
                name: "txset-anchored-to-lcl".into(),
                seq: data.ledger_seq,
                reason: format!(
                    "txset built on {}, LCL is {}",
                    data.tx_set.previous_ledger_hash.abbrev(),
                    lcl.abbrev()
                ),
            });
        }
        for (name, check) in &self.invariants {
            check(data, lcl).map_err(|reason| SinkError::InvariantDoesNotHold {
                name: name.clone(),
                seq: data.ledger_seq,
                reason,
            })?;
        }
        Ok(())
    }
}

impl Default for InMemoryLedgerSink {
    fn default() -> Self {
        Self::from_genesis()
    }
}

impl LedgerApplicationSink for InMemoryLedgerSink {
    fn last_closed_ledger(&self) -> Result<LedgerHeaderRecord, SinkError> {
        let state = self.inner.read().map_err(|_| SinkError::LockPoisoned)?;
        Ok(state.lcl.clone())
    }

    fn close_ledger(&self, data: &LedgerCloseData) -> Result<LedgerHeaderRecord, SinkError> {
        let mut state = self.inner.write().map_err(|_| SinkError::LockPoisoned)?;

        let expected = state.lcl.sequence() + 1;
        if data.ledger_seq != expected {
            return Err(SinkError::OutOfOrder {
                expected,
                actual: data.ledger_seq,
            });
        }
        self.check_invariants(data, &state.lcl)?;

        let tx_set_hash = tx_set_contents_hash(&data.tx_set);
        let bucket = match state.next_bucket_list_hash.take() {
            Some(forced) => forced,
            None => bucket_list_hash(&state.lcl.bucket_list_hash(), &tx_set_hash),
        };

        let header = LedgerHeader {
            ledger_seq: data.ledger_seq,
            previous_ledger_hash: state.lcl.hash,
            bucket_list_hash: bucket,
            consensus_value: data.consensus_value.clone(),
        };
        let closed = LedgerHeaderRecord::new(header_hash(&header), header);

        debug!(
            seq = closed.sequence(),
            hash = %closed.hash.abbrev(),
            txs = data.tx_set.len(),
            "ledger closed"
        );

        state.lcl = closed.clone();
        state.closed_ledgers += 1;
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use lcr_crypto::HeaderChainVerifier;
    use lcr_types::{ConsensusValue, Transaction, TransactionSet};

    use super::*;

    fn close_data(sink: &InMemoryLedgerSink, txs: &[&[u8]]) -> LedgerCloseData {
        let lcl = sink.last_closed_ledger().unwrap();
        let tx_set = TransactionSet::new(
            lcl.hash,
            txs.iter().map(|t| Transaction::new(t.to_vec())).collect(),
        );
        let consensus_value = ConsensusValue {
            tx_set_hash: tx_set_contents_hash(&tx_set),
            close_time: u64::from(lcl.sequence()) * 5,
        };
        LedgerCloseData::new(lcl.sequence() + 1, tx_set, consensus_value)
    }

    #[test]
    fn starts_at_genesis() {
        let sink = InMemoryLedgerSink::default();
        assert_eq!(sink.last_closed_ledger().unwrap(), genesis_header());
        assert_eq!(sink.closed_ledger_count().unwrap(), 0);
    }

    #[test]
    fn closes_form_a_valid_chain() {
        let sink = InMemoryLedgerSink::from_genesis();
        let mut chain = vec![sink.last_closed_ledger().unwrap()];
        for i in 0..5u8 {
            let data = close_data(&sink, &[&[i]]);
            chain.push(sink.close_ledger(&data).unwrap());
        }
        assert_eq!(sink.closed_ledger_count().unwrap(), 5);
        assert_eq!(sink.last_closed_ledger().unwrap().sequence(), 6);
        assert!(HeaderChainVerifier::verify_chain(&chain).is_ok());
    }

    #[test]
    fn identical_inputs_produce_identical_hashes() {
        let a = InMemoryLedgerSink::from_genesis();
        let b = InMemoryLedgerSink::from_genesis();
        let closed_a = a.close_ledger(&close_data(&a, &[b"tx"])).unwrap();
        let closed_b = b.close_ledger(&close_data(&b, &[b"tx"])).unwrap();
        assert_eq!(closed_a, closed_b);
    }

    #[test]
    fn out_of_order_close_rejected() {
        let sink = InMemoryLedgerSink::from_genesis();
        let mut data = close_data(&sink, &[]);
        data.ledger_seq = 5;
        let err = sink.close_ledger(&data).unwrap_err();
        assert_eq!(err, SinkError::OutOfOrder { expected: 2, actual: 5 });
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn unanchored_tx_set_is_invariant_violation() {
        let sink = InMemoryLedgerSink::from_genesis();
        let mut data = close_data(&sink, &[b"tx"]);
        data.tx_set.previous_ledger_hash = Hash256::digest(b"fork");
        let err = sink.close_ledger(&data).unwrap_err();
        assert!(err.is_invariant_violation());
        assert_eq!(sink.closed_ledger_count().unwrap(), 0);
    }

    #[test]
    fn custom_invariant_runs_before_close() {
        let sink = InMemoryLedgerSink::from_genesis().with_invariant("max-one-tx", |data, _| {
            if data.tx_set.len() > 1 {
                Err(format!("{} transactions", data.tx_set.len()))
            } else {
                Ok(())
            }
        });
        assert!(sink.close_ledger(&close_data(&sink, &[b"a"])).is_ok());
        let err = sink.close_ledger(&close_data(&sink, &[b"a", b"b"])).unwrap_err();
        match err {
            SinkError::InvariantDoesNotHold { name, seq, reason } => {
                assert_eq!(name, "max-one-tx");
                assert_eq!(seq, 3);
                assert_eq!(reason, "2 transactions");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bucket_override_applies_once() {
        let sink = InMemoryLedgerSink::from_genesis();
        let forced = Hash256::digest(b"forced-bucket");
        sink.set_next_bucket_list_hash(forced).unwrap();

        let first = sink.close_ledger(&close_data(&sink, &[])).unwrap();
        assert_eq!(first.bucket_list_hash(), forced);

        let second = sink.close_ledger(&close_data(&sink, &[])).unwrap();
        assert_ne!(second.bucket_list_hash(), forced);
        assert_eq!(
            second.bucket_list_hash(),
            bucket_list_hash(&forced, &second.tx_set_hash())
        );
    }
}
