use lcr_crypto::{header_hash, tx_set_contents_hash};
use lcr_types::{ConsensusValue, Hash256, LedgerHeader, LedgerHeaderRecord, LedgerSeq, TransactionSet};

/// Sequence number of the first ledger of every chain.
pub const GENESIS_LEDGER_SEQ: LedgerSeq = 1;

/// The genesis ledger: sequence 1, an empty transaction set on top of the
/// zero hash, and an empty bucket list.
pub fn genesis_header() -> LedgerHeaderRecord {
    let header = LedgerHeader {
        ledger_seq: GENESIS_LEDGER_SEQ,
        previous_ledger_hash: Hash256::zero(),
        bucket_list_hash: Hash256::zero(),
        consensus_value: ConsensusValue {
            tx_set_hash: tx_set_contents_hash(&TransactionSet::empty(Hash256::zero())),
            close_time: 0,
        },
    };
    LedgerHeaderRecord::new(header_hash(&header), header)
}
