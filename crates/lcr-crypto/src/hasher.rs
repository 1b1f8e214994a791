use lcr_types::{Hash256, LedgerHeader, TransactionSet};

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"lcr-header-v1"`) that is
/// prepended to every hash computation, so a header and a transaction set
/// with identical bytes never share a hash.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for ledger headers.
    pub const HEADER: Self = Self {
        domain: "lcr-header-v1",
    };
    /// Hasher for transaction set contents.
    pub const TX_SET: Self = Self {
        domain: "lcr-txset-v1",
    };
    /// Hasher for bucket-list states.
    pub const BUCKET: Self = Self {
        domain: "lcr-bucket-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Hash256 {
        let mut hasher = self.begin();
        hasher.update(data);
        Hash256::from_hash(*hasher.finalize().as_bytes())
    }

    /// Incremental hasher already seeded with the domain tag.
    pub fn begin(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}

/// Hash of a ledger header. This is the identity the chain links through
/// `previous_ledger_hash`.
pub fn header_hash(header: &LedgerHeader) -> Hash256 {
    let mut hasher = ContentHasher::HEADER.begin();
    hasher.update(&header.ledger_seq.to_le_bytes());
    hasher.update(header.previous_ledger_hash.as_bytes());
    hasher.update(header.bucket_list_hash.as_bytes());
    hasher.update(header.consensus_value.tx_set_hash.as_bytes());
    hasher.update(&header.consensus_value.close_time.to_le_bytes());
    Hash256::from_hash(*hasher.finalize().as_bytes())
}

/// Contents hash of a transaction set.
///
/// Covers the anchoring previous-ledger hash followed by each envelope
/// (length-prefixed) in order. Empty and non-empty sets go through the same
/// computation.
pub fn tx_set_contents_hash(tx_set: &TransactionSet) -> Hash256 {
    let mut hasher = ContentHasher::TX_SET.begin();
    hasher.update(tx_set.previous_ledger_hash.as_bytes());
    for tx in &tx_set.transactions {
        hasher.update(&(tx.envelope.len() as u64).to_le_bytes());
        hasher.update(&tx.envelope);
    }
    Hash256::from_hash(*hasher.finalize().as_bytes())
}

/// Next bucket-list hash after applying a transaction set.
pub fn bucket_list_hash(previous: &Hash256, tx_set_hash: &Hash256) -> Hash256 {
    let mut hasher = ContentHasher::BUCKET.begin();
    hasher.update(previous.as_bytes());
    hasher.update(tx_set_hash.as_bytes());
    Hash256::from_hash(*hasher.finalize().as_bytes())
}
