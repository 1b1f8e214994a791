use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use lcr_types::{LedgerHeaderRecord, LedgerSeq, TransactionSet, TransactionSetRecord};
use serde::Serialize;
use tracing::debug;

use crate::checkpoint::CheckpointSchedule;
use crate::codec::write_record;
use crate::error::{ArchiveError, ArchiveResult};
use crate::layout::{ArchiveFile, FileCategory};
use crate::reader::SequencedRecord;

/// Appends framed records to a new archive file.
pub struct RecordWriter<T> {
    path: PathBuf,
    output: BufWriter<File>,
    last_seq: Option<LedgerSeq>,
    records: u64,
    _record: PhantomData<fn(&T)>,
}

impl<T: Serialize + SequencedRecord> RecordWriter<T> {
    /// Create (or truncate) the file at `path`, creating parent directories.
    pub fn create(path: &Path) -> ArchiveResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            output: BufWriter::new(file),
            last_seq: None,
            records: 0,
            _record: PhantomData,
        })
    }

    /// Append one record. Sequences must be strictly increasing.
    pub fn append(&mut self, record: &T) -> ArchiveResult<()> {
        let seq = record.ledger_seq();
        if let Some(previous) = self.last_seq {
            if seq <= previous {
                return Err(ArchiveError::OutOfOrder {
                    path: self.path.clone(),
                    previous,
                    actual: seq,
                });
            }
        }
        write_record(&mut self.output, record)?;
        self.last_seq = Some(seq);
        self.records += 1;
        Ok(())
    }

    /// Number of records appended so far.
    pub fn len(&self) -> u64 {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Flush and sync the file. Returns the number of records written.
    pub fn finish(mut self) -> ArchiveResult<u64> {
        self.output.flush()?;
        self.output.get_ref().sync_all()?;
        Ok(self.records)
    }
}

/// Result of publishing one checkpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointFiles {
    pub checkpoint: LedgerSeq,
    pub header_path: PathBuf,
    pub tx_path: PathBuf,
    pub ledgers: u64,
    pub tx_sets: u64,
}

/// Writes the header and transaction files of one checkpoint.
///
/// Every ledger gets a header record; only ledgers with a non-empty
/// transaction set get a transaction record.
pub struct CheckpointWriter {
    checkpoint: LedgerSeq,
    first: LedgerSeq,
    headers: RecordWriter<LedgerHeaderRecord>,
    tx_sets: RecordWriter<TransactionSetRecord>,
}

impl CheckpointWriter {
    /// Start writing `checkpoint` under the archive `root`.
    pub fn create(
        root: &Path,
        schedule: &CheckpointSchedule,
        checkpoint: LedgerSeq,
    ) -> ArchiveResult<Self> {
        let header_path = ArchiveFile::new(FileCategory::Ledger, checkpoint).local_path(root);
        let tx_path = ArchiveFile::new(FileCategory::Transactions, checkpoint).local_path(root);
        Ok(Self {
            checkpoint,
            first: schedule.first_in_checkpoint(checkpoint),
            headers: RecordWriter::create(&header_path)?,
            tx_sets: RecordWriter::create(&tx_path)?,
        })
    }

    pub fn checkpoint(&self) -> LedgerSeq {
        self.checkpoint
    }

    /// Archive one ledger and the transaction set it closed.
    pub fn push_ledger(
        &mut self,
        header: &LedgerHeaderRecord,
        tx_set: &TransactionSet,
    ) -> ArchiveResult<()> {
        let seq = header.sequence();
        if seq < self.first || seq > self.checkpoint {
            return Err(ArchiveError::OutsideCheckpoint {
                checkpoint: self.checkpoint,
                seq,
            });
        }
        self.headers.append(header)?;
        if !tx_set.is_empty() {
            self.tx_sets
                .append(&TransactionSetRecord::new(seq, tx_set.clone()))?;
        }
        Ok(())
    }

    /// Flush both files.
    pub fn finish(self) -> ArchiveResult<CheckpointFiles> {
        let header_path = self.headers.path.clone();
        let tx_path = self.tx_sets.path.clone();
        let ledgers = self.headers.finish()?;
        let tx_sets = self.tx_sets.finish()?;
        debug!(
            checkpoint = self.checkpoint,
            ledgers, tx_sets, "checkpoint written"
        );
        Ok(CheckpointFiles {
            checkpoint: self.checkpoint,
            header_path,
            tx_path,
            ledgers,
            tx_sets,
        })
    }
}
