use std::io;
use std::path::PathBuf;

use lcr_types::LedgerSeq;

/// Errors produced while reading or writing checkpoint archives.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// I/O error during file operations.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// An archive file expected on local storage does not exist.
    #[error("archive file missing: {}", .0.display())]
    Missing(PathBuf),

    /// CRC integrity check failed for a record.
    #[error("CRC integrity check failed in {} at offset {offset}: expected {expected:#010x}, got {actual:#010x}", .path.display())]
    CrcMismatch {
        path: PathBuf,
        offset: u64,
        expected: u32,
        actual: u32,
    },

    /// The file ends in the middle of a record.
    #[error("truncated record in {} at offset {offset}", .path.display())]
    Truncated { path: PathBuf, offset: u64 },

    /// A record header carries an impossible length.
    #[error("invalid record length {length} in {} at offset {offset}", .path.display())]
    InvalidLength {
        path: PathBuf,
        offset: u64,
        length: u32,
    },

    /// The payload passed its CRC but does not decode.
    #[error("undecodable record in {} at offset {offset}: {reason}", .path.display())]
    Decode {
        path: PathBuf,
        offset: u64,
        reason: String,
    },

    /// Serialization failure while writing.
    #[error("serialization error: {0}")]
    Encode(String),

    /// Records in a stream are not strictly increasing by ledger sequence.
    #[error("record for ledger {actual} follows ledger {previous} in {}", .path.display())]
    OutOfOrder {
        path: PathBuf,
        previous: LedgerSeq,
        actual: LedgerSeq,
    },

    /// A ledger was written to a checkpoint that does not contain it.
    #[error("ledger {seq} does not belong to checkpoint {checkpoint}")]
    OutsideCheckpoint {
        checkpoint: LedgerSeq,
        seq: LedgerSeq,
    },

    /// The checkpoint at or after `seq` lies past the last ledger sequence.
    #[error("checkpoint for ledger {seq} at frequency {frequency} exceeds the ledger sequence range")]
    CheckpointOverflow { seq: LedgerSeq, frequency: u32 },

    /// Checkpoint frequency must be positive.
    #[error("invalid checkpoint frequency: {0}")]
    InvalidFrequency(u32),
}

impl ArchiveError {
    /// Returns `true` if the error indicates damaged or missing local files
    /// rather than a misuse of the API.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Missing(_)
                | Self::CrcMismatch { .. }
                | Self::Truncated { .. }
                | Self::InvalidLength { .. }
                | Self::Decode { .. }
                | Self::OutOfOrder { .. }
        )
    }
}

/// Convenience alias used throughout the archive crate.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
