//! Checkpoint archive files for ledger chain replay.
//!
//! History is archived per checkpoint: a fixed-size span of ledgers whose
//! headers and transaction sets are stored together in a pair of files.
//!
//! # Architecture
//!
//! - **Schedule** (`CheckpointSchedule`): checkpoint boundary arithmetic
//! - **Layout** (`ArchiveFile`): where a checkpoint's files live on disk
//! - **Framing** (`codec`): length + CRC32 framed bincode records
//! - **Readers** (`HeaderRecordReader`, `TxSetRecordReader`): sequential,
//!   forward-only record streams
//! - **Writers** (`RecordWriter`, `CheckpointWriter`): publish a checkpoint

pub mod checkpoint;
pub mod codec;
pub mod error;
pub mod layout;
pub mod reader;
pub mod writer;

pub use checkpoint::{CheckpointSchedule, DEFAULT_CHECKPOINT_FREQUENCY};
pub use error::{ArchiveError, ArchiveResult};
pub use layout::{ArchiveFile, FileCategory};
pub use reader::{HeaderRecordReader, RecordReader, SequencedRecord, TxSetRecordReader};
pub use writer::{CheckpointFiles, CheckpointWriter, RecordWriter};
