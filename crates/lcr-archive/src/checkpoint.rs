use lcr_types::LedgerSeq;
use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};

/// Default number of ledgers per checkpoint.
pub const DEFAULT_CHECKPOINT_FREQUENCY: u32 = 64;

/// Checkpoint boundary arithmetic.
///
/// A checkpoint is named by its last ledger: with frequency `F` the
/// checkpoints are `F-1, 2F-1, 3F-1, ...`. The first checkpoint is one
/// ledger short because ledger 0 does not exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSchedule {
    frequency: u32,
}

impl CheckpointSchedule {
    pub fn new(frequency: u32) -> ArchiveResult<Self> {
        if frequency == 0 {
            return Err(ArchiveError::InvalidFrequency(frequency));
        }
        Ok(Self { frequency })
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// The checkpoint whose span contains `seq`.
    ///
    /// Fails when that checkpoint lies past the last representable ledger,
    /// which happens near `u32::MAX` unless `F` divides `2^32`.
    pub fn checkpoint_containing(&self, seq: LedgerSeq) -> ArchiveResult<LedgerSeq> {
        let freq = u64::from(self.frequency);
        let checkpoint = (u64::from(seq) / freq + 1) * freq - 1;
        LedgerSeq::try_from(checkpoint).map_err(|_| ArchiveError::CheckpointOverflow {
            seq,
            frequency: self.frequency,
        })
    }

    /// Returns `true` if `seq` is the last ledger of its checkpoint.
    pub fn is_checkpoint(&self, seq: LedgerSeq) -> bool {
        (u64::from(seq) + 1) % u64::from(self.frequency) == 0
    }

    /// First ledger archived in `checkpoint`.
    pub fn first_in_checkpoint(&self, checkpoint: LedgerSeq) -> LedgerSeq {
        let first = (u64::from(checkpoint) + 1)
            .saturating_sub(u64::from(self.frequency))
            .max(1);
        // never above `checkpoint`
        first as LedgerSeq
    }

    /// The checkpoint after `checkpoint`.
    pub fn next(&self, checkpoint: LedgerSeq) -> ArchiveResult<LedgerSeq> {
        checkpoint
            .checked_add(self.frequency)
            .ok_or(ArchiveError::CheckpointOverflow {
                seq: checkpoint,
                frequency: self.frequency,
            })
    }
}

impl Default for CheckpointSchedule {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_CHECKPOINT_FREQUENCY,
        }
    }
}
