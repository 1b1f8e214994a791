use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ledger::LedgerSeq;

/// Inclusive range of ledger sequences `[first, last]`.
///
/// Always satisfies `first <= last`; the only constructor enforces it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerRange {
    first: LedgerSeq,
    last: LedgerSeq,
}

impl LedgerRange {
    /// Create a range, rejecting `first > last`.
    pub fn new(first: LedgerSeq, last: LedgerSeq) -> Result<Self, TypeError> {
        if first > last {
            return Err(TypeError::InvalidRange { first, last });
        }
        Ok(Self { first, last })
    }

    pub fn first(&self) -> LedgerSeq {
        self.first
    }

    pub fn last(&self) -> LedgerSeq {
        self.last
    }

    /// Returns `true` if `seq` lies within the range.
    pub fn contains(&self, seq: LedgerSeq) -> bool {
        self.first <= seq && seq <= self.last
    }

    /// Number of ledgers in the range.
    pub fn len(&self) -> u64 {
        u64::from(self.last - self.first) + 1
    }

    /// A range always holds at least one ledger.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for LedgerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.first, self.last)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn single_ledger_range() {
        let range = LedgerRange::new(5, 5).unwrap();
        assert_eq!(range.len(), 1);
        assert!(range.contains(5));
        assert!(!range.contains(4));
        assert!(!range.contains(6));
    }

    #[test]
    fn inverted_range_rejected() {
        let err = LedgerRange::new(10, 9).unwrap_err();
        assert_eq!(err, TypeError::InvalidRange { first: 10, last: 9 });
    }

    #[test]
    fn display_format() {
        let range = LedgerRange::new(70, 140).unwrap();
        assert_eq!(range.to_string(), "[70,140]");
    }

    proptest! {
        #[test]
        fn constructed_ranges_are_ordered(a in 0u32..100_000, b in 0u32..100_000) {
            match LedgerRange::new(a, b) {
                Ok(range) => {
                    prop_assert!(range.first() <= range.last());
                    prop_assert_eq!(range.len(), u64::from(b - a) + 1);
                }
                Err(_) => prop_assert!(a > b),
            }
        }
    }
}
