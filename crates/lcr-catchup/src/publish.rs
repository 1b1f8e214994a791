use std::path::{Path, PathBuf};
use std::sync::Arc;

use lcr_archive::{CheckpointFiles, CheckpointSchedule, CheckpointWriter};
use lcr_crypto::tx_set_contents_hash;
use lcr_ledger::{LedgerApplicationSink, LedgerCloseData};
use lcr_types::{ConsensusValue, LedgerHeaderRecord, Transaction, TransactionSet};
use tracing::{debug, info};

use crate::error::PublishError;

/// Closes ledgers on a sink and archives each one in its checkpoint.
///
/// The archive it writes is exactly what
/// [`LedgerChainReplayer`](crate::LedgerChainReplayer) reads: one header per
/// ledger, one transaction record per ledger with a non-empty set. The
/// starting LCL is archived too, without its transaction set, so a replay
/// from the same starting point can knit up with it.
pub struct HistoryPublisher<S> {
    root: PathBuf,
    schedule: CheckpointSchedule,
    sink: Arc<S>,
    writer: Option<CheckpointWriter>,
    published: Vec<CheckpointFiles>,
}

impl<S: LedgerApplicationSink> HistoryPublisher<S> {
    /// Start publishing under `root` from the sink's current LCL.
    pub fn start(
        root: impl Into<PathBuf>,
        schedule: CheckpointSchedule,
        sink: Arc<S>,
    ) -> Result<Self, PublishError> {
        let root = root.into();
        let lcl = sink.last_closed_ledger()?;
        info!(
            root = %root.display(),
            lcl = %lcl.abbrev(),
            frequency = schedule.frequency(),
            "publishing history"
        );
        let mut publisher = Self {
            root,
            schedule,
            sink,
            writer: None,
            published: Vec::new(),
        };
        publisher.archive(&lcl, &TransactionSet::empty(lcl.previous_hash()))?;
        Ok(publisher)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schedule(&self) -> CheckpointSchedule {
        self.schedule
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Close the next ledger with `transactions` and archive it.
    pub fn close_ledger(
        &mut self,
        transactions: Vec<Transaction>,
        close_time: u64,
    ) -> Result<LedgerHeaderRecord, PublishError> {
        let lcl = self.sink.last_closed_ledger()?;
        let tx_set = TransactionSet::new(lcl.hash, transactions);
        let consensus_value = ConsensusValue {
            tx_set_hash: tx_set_contents_hash(&tx_set),
            close_time,
        };
        let data = LedgerCloseData::new(lcl.sequence() + 1, tx_set, consensus_value);
        let closed = self.sink.close_ledger(&data)?;
        self.archive(&closed, &data.tx_set)?;
        Ok(closed)
    }

    /// Checkpoints completed so far.
    pub fn published(&self) -> &[CheckpointFiles] {
        &self.published
    }

    /// Flush the partially filled checkpoint, if any, and return every
    /// checkpoint written.
    pub fn finish(mut self) -> Result<Vec<CheckpointFiles>, PublishError> {
        if let Some(writer) = self.writer.take() {
            let files = writer.finish()?;
            debug!(checkpoint = files.checkpoint, "published partial checkpoint");
            self.published.push(files);
        }
        Ok(self.published)
    }

    fn archive(
        &mut self,
        header: &LedgerHeaderRecord,
        tx_set: &TransactionSet,
    ) -> Result<(), PublishError> {
        let seq = header.sequence();
        let checkpoint = self.schedule.checkpoint_containing(seq)?;
        let writer = match self.writer.take() {
            Some(writer) if writer.checkpoint() == checkpoint => writer,
            Some(stale) => {
                self.published.push(stale.finish()?);
                CheckpointWriter::create(&self.root, &self.schedule, checkpoint)?
            }
            None => CheckpointWriter::create(&self.root, &self.schedule, checkpoint)?,
        };
        let writer = self.writer.insert(writer);
        writer.push_ledger(header, tx_set)?;

        if self.schedule.is_checkpoint(seq) {
            if let Some(done) = self.writer.take() {
                let files = done.finish()?;
                info!(
                    checkpoint = files.checkpoint,
                    ledgers = files.ledgers,
                    tx_sets = files.tx_sets,
                    "published checkpoint"
                );
                self.published.push(files);
            }
        }
        Ok(())
    }
}
