use std::fs::File;
use std::io::{self, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use lcr_types::{LedgerHeaderRecord, LedgerSeq, TransactionSetRecord};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::{decode_payload, read_frame, HEADER_SIZE};
use crate::error::{ArchiveError, ArchiveResult};

/// A record that belongs to one ledger sequence.
pub trait SequencedRecord {
    fn ledger_seq(&self) -> LedgerSeq;
}

impl SequencedRecord for LedgerHeaderRecord {
    fn ledger_seq(&self) -> LedgerSeq {
        self.sequence()
    }
}

impl SequencedRecord for TransactionSetRecord {
    fn ledger_seq(&self) -> LedgerSeq {
        self.ledger_seq
    }
}

/// Sequential, forward-only reader over one archive file.
///
/// A reader starts closed. [`open`](Self::open) replaces any file currently
/// open; reading from a closed reader yields end of stream. Any read error
/// closes the reader, so a stream never resumes past corruption. Records
/// must be strictly increasing by ledger sequence.
pub struct RecordReader<T> {
    stream: Option<OpenStream>,
    _record: PhantomData<fn() -> T>,
}

struct OpenStream {
    path: PathBuf,
    input: BufReader<File>,
    offset: u64,
    last_seq: Option<LedgerSeq>,
}

/// Reader over a checkpoint's ledger header file.
pub type HeaderRecordReader = RecordReader<LedgerHeaderRecord>;

/// Reader over a checkpoint's transaction set file.
pub type TxSetRecordReader = RecordReader<TransactionSetRecord>;

impl<T: DeserializeOwned + SequencedRecord> RecordReader<T> {
    /// A closed reader.
    pub fn new() -> Self {
        Self {
            stream: None,
            _record: PhantomData,
        }
    }

    /// Open `path`, closing whatever was open before.
    pub fn open(&mut self, path: &Path) -> ArchiveResult<()> {
        self.close();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArchiveError::Missing(path.to_path_buf()),
            _ => ArchiveError::Io(e),
        })?;
        debug!(path = %path.display(), "opened archive file");
        self.stream = Some(OpenStream {
            path: path.to_path_buf(),
            input: BufReader::new(file),
            offset: 0,
            last_seq: None,
        });
        Ok(())
    }

    /// Close the underlying file, if any.
    pub fn close(&mut self) {
        self.stream = None;
    }

    /// Returns `true` while a file is open and has not failed.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Path of the open file.
    pub fn path(&self) -> Option<&Path> {
        self.stream.as_ref().map(|s| s.path.as_path())
    }

    /// Read the next record, or `None` at end of stream.
    pub fn read_one(&mut self) -> ArchiveResult<Option<T>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        let result = Self::read_from(stream);
        if result.is_err() {
            self.close();
        }
        result
    }

    fn read_from(stream: &mut OpenStream) -> ArchiveResult<Option<T>> {
        let offset = stream.offset;
        let Some(payload) = read_frame(&mut stream.input, &stream.path, offset)? else {
            return Ok(None);
        };
        let record: T = decode_payload(&payload, &stream.path, offset)?;

        let seq = record.ledger_seq();
        if let Some(previous) = stream.last_seq {
            if seq <= previous {
                return Err(ArchiveError::OutOfOrder {
                    path: stream.path.clone(),
                    previous,
                    actual: seq,
                });
            }
        }
        stream.last_seq = Some(seq);
        stream.offset += (HEADER_SIZE + payload.len()) as u64;
        Ok(Some(record))
    }
}

impl<T: DeserializeOwned + SequencedRecord> Default for RecordReader<T> {
    fn default() -> Self {
        Self::new()
    }
}
