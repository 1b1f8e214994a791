use std::sync::Arc;

use lcr_archive::{
    ArchiveError, ArchiveFile, CheckpointSchedule, FileCategory, HeaderRecordReader,
    TxSetRecordReader,
};
use lcr_crypto::tx_set_contents_hash;
use lcr_ledger::{LedgerApplicationSink, LedgerCloseData, SinkError};
use lcr_types::{LedgerHeaderRecord, LedgerRange, LedgerSeq};
use tracing::{debug, error, info};

use crate::config::ReplayConfig;
use crate::continuity::{Continuity, ContinuityValidator};
use crate::error::{ConfigError, InvariantViolation, ReplayError, ReplayErrorKind};
use crate::metrics::ApplyMetrics;
use crate::progress::{format_progress, LogProgress, ProgressReporter};
use crate::resolver::TxSetResolver;
use crate::work::{StepReport, StepState, WorkState};

const POSSIBLY_CORRUPTED_LOCAL_FS: &str =
    "unable to read local archive files, possibly corrupted local filesystem; \
     remove the download directory and retry catch-up";

/// Mutable working state of one replay. Rebuilt on every reset.
#[derive(Debug)]
struct ReplayState {
    last_applied: LedgerHeaderRecord,
    files_open: bool,
    current_checkpoint: LedgerSeq,
}

enum StepError {
    Fatal(ReplayError),
    Invariant(InvariantViolation),
}

impl From<ReplayError> for StepError {
    fn from(err: ReplayError) -> Self {
        Self::Fatal(err)
    }
}

impl From<ArchiveError> for StepError {
    fn from(err: ArchiveError) -> Self {
        Self::Fatal(ReplayError::Archive(err))
    }
}

impl StepError {
    fn from_sink(seq: LedgerSeq, err: SinkError) -> Self {
        if err.is_invariant_violation() {
            Self::Invariant(InvariantViolation { seq, source: err })
        } else {
            Self::Fatal(ReplayError::Sink(err))
        }
    }
}

/// Replays a downloaded range of ledgers into a [`LedgerApplicationSink`].
///
/// Driven by an external scheduler: every [`step`](Self::step) applies at
/// most one ledger, or moves the checkpoint cursor past an exhausted header
/// stream. The sink's last-closed ledger is read fresh for every check and
/// never cached across steps.
pub struct LedgerChainReplayer<S> {
    config: ReplayConfig,
    schedule: CheckpointSchedule,
    sink: Arc<S>,
    progress: Box<dyn ProgressReporter>,
    metrics: Arc<ApplyMetrics>,
    range: LedgerRange,
    state: ReplayState,
    headers: HeaderRecordReader,
    tx_sets: TxSetResolver<TxSetRecordReader>,
    work_state: WorkState,
}

impl<S: LedgerApplicationSink> LedgerChainReplayer<S> {
    /// A replayer for `range`, starting from the caller's view of the LCL.
    ///
    /// Rejects a range whose checkpoints lie past the last ledger sequence.
    pub fn new(
        config: ReplayConfig,
        sink: Arc<S>,
        range: LedgerRange,
        lcl: LedgerHeaderRecord,
    ) -> Result<Self, ConfigError> {
        let schedule = config.schedule()?;
        let current_checkpoint = schedule.checkpoint_containing(range.first())?;
        let mut replayer = Self {
            config,
            schedule,
            sink,
            progress: Box::new(LogProgress),
            metrics: Arc::new(ApplyMetrics::new()),
            range,
            state: ReplayState {
                last_applied: lcl.clone(),
                files_open: false,
                current_checkpoint,
            },
            headers: HeaderRecordReader::new(),
            tx_sets: TxSetResolver::new(TxSetRecordReader::new()),
            work_state: WorkState::Pending,
        };
        replayer.reset(range, lcl)?;
        Ok(replayer)
    }

    pub fn with_progress(mut self, progress: impl ProgressReporter + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Share the application counters with an external collector.
    pub fn with_metrics(mut self, metrics: Arc<ApplyMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<ApplyMetrics> {
        &self.metrics
    }

    /// Start over on `range` from `lcl`, discarding all progress.
    ///
    /// A range whose checkpoints cannot be represented is rejected and the
    /// replayer is left as it was.
    pub fn reset(
        &mut self,
        range: LedgerRange,
        lcl: LedgerHeaderRecord,
    ) -> Result<(), ConfigError> {
        let current_checkpoint = self.schedule.checkpoint_containing(range.first())?;
        self.schedule.checkpoint_containing(range.last())?;
        info!(range = %range, lcl = %lcl.abbrev(), "applying transactions for ledgers");
        self.close_input_files();
        self.range = range;
        self.state = ReplayState {
            last_applied: lcl,
            files_open: false,
            current_checkpoint,
        };
        self.work_state = WorkState::Pending;
        Ok(())
    }

    /// Run one unit of work.
    ///
    /// Chain and archive errors end the work and come back as
    /// [`StepState::Failure`]. A broken sink invariant is returned as `Err`
    /// and the caller must not continue with the sink.
    pub fn step(&mut self) -> Result<StepReport, InvariantViolation> {
        if self.work_state.is_done() {
            let state = if self.work_state == WorkState::Success {
                StepState::Success
            } else {
                StepState::Failure(ReplayError::AlreadyFailed)
            };
            return Ok(self.report(state));
        }
        self.work_state = WorkState::Running;

        match self.advance() {
            Ok(state) => {
                if matches!(state, StepState::Success) {
                    info!(
                        range = %self.range,
                        last_applied = %self.state.last_applied.abbrev(),
                        "replay complete"
                    );
                    self.close_input_files();
                }
                self.work_state = state.work_state();
                Ok(self.report(state))
            }
            Err(StepError::Fatal(err)) => {
                match err.kind() {
                    ReplayErrorKind::Filesystem => {
                        error!(error = %err, "{POSSIBLY_CORRUPTED_LOCAL_FS}")
                    }
                    ReplayErrorKind::Chain | ReplayErrorKind::Sink => {
                        error!(error = %err, "replay failed")
                    }
                }
                self.close_input_files();
                self.work_state = WorkState::Failure;
                Ok(self.report(StepState::Failure(err)))
            }
            Err(StepError::Invariant(violation)) => {
                error!(seq = violation.seq, error = %violation, "replay failed");
                self.close_input_files();
                self.work_state = WorkState::Failure;
                Err(violation)
            }
        }
    }

    /// Step until the work finishes or `max_steps` steps have run.
    ///
    /// Always runs at least one step. A report still in
    /// [`StepState::Running`] means the budget ran out.
    pub fn run_to_completion(&mut self, max_steps: u64) -> Result<StepReport, InvariantViolation> {
        let mut report = self.step()?;
        let mut steps = 1;
        while report.is_running() && steps < max_steps {
            report = self.step()?;
            steps += 1;
        }
        Ok(report)
    }

    /// Human-readable status for display.
    pub fn status(&self) -> String {
        match self.work_state {
            WorkState::Running => format_progress(
                self.range.first(),
                self.range.last(),
                self.state.current_checkpoint,
            ),
            state => format!("{} {state}", self.config.work_name),
        }
    }

    pub fn range(&self) -> LedgerRange {
        self.range
    }

    pub fn work_state(&self) -> WorkState {
        self.work_state
    }

    /// The checkpoint currently being read.
    pub fn current_checkpoint(&self) -> LedgerSeq {
        self.state.current_checkpoint
    }

    pub fn files_open(&self) -> bool {
        self.state.files_open
    }

    pub fn last_applied(&self) -> &LedgerHeaderRecord {
        &self.state.last_applied
    }

    /// Sequence of the transaction record held as look-ahead, if any.
    pub fn buffered_tx_set_seq(&self) -> Option<LedgerSeq> {
        self.tx_sets.buffered_seq()
    }

    fn report(&self, state: StepState) -> StepReport {
        StepReport {
            state,
            last_applied: self.state.last_applied.clone(),
        }
    }

    fn advance(&mut self) -> Result<StepState, StepError> {
        if !self.state.files_open {
            self.open_current_input_files()?;
        }

        if !self.apply_next_ledger()? {
            let next = self.schedule.next(self.state.current_checkpoint)?;
            debug!(
                checkpoint = self.state.current_checkpoint,
                next, "checkpoint exhausted"
            );
            self.state.current_checkpoint = next;
            self.close_input_files();
        }

        self.progress.update(&self.status());

        let lcl = self
            .sink
            .last_closed_ledger()
            .map_err(|e| StepError::Fatal(ReplayError::Sink(e)))?;
        if lcl.sequence() == self.range.last() {
            Ok(StepState::Success)
        } else {
            Ok(StepState::Running)
        }
    }

    fn open_current_input_files(&mut self) -> Result<(), ArchiveError> {
        self.close_input_files();
        let checkpoint = self.state.current_checkpoint;
        let root = &self.config.download_dir;
        let header_path = ArchiveFile::new(FileCategory::Ledger, checkpoint).local_path(root);
        let tx_path = ArchiveFile::new(FileCategory::Transactions, checkpoint).local_path(root);

        debug!(path = %header_path.display(), "replaying ledger headers");
        debug!(path = %tx_path.display(), "replaying transactions");
        self.headers.open(&header_path)?;
        self.tx_sets.source_mut().open(&tx_path)?;
        self.state.files_open = true;
        Ok(())
    }

    fn close_input_files(&mut self) {
        self.headers.close();
        self.tx_sets.source_mut().close();
        self.tx_sets.clear();
        self.state.files_open = false;
    }

    /// Read one header and apply it if it is the ledger after the LCL.
    ///
    /// Returns `false` once the header stream of the current checkpoint is
    /// exhausted.
    fn apply_next_ledger(&mut self) -> Result<bool, StepError> {
        let Some(header) = self.headers.read_one()? else {
            return Ok(false);
        };
        let seq = header.sequence();

        let lcl = self
            .sink
            .last_closed_ledger()
            .map_err(|e| StepError::Fatal(ReplayError::Sink(e)))?;

        let continuity = ContinuityValidator::classify(&header, &lcl).map_err(|err| {
            self.metrics.record_failure();
            StepError::from(err)
        })?;
        match continuity {
            Continuity::TooOld => debug!(seq, "catchup skipping old ledger"),
            Continuity::KnitsUpBeforeLcl => debug!(seq, "catchup at 1-before LCL, hash correct"),
            Continuity::KnitsUpAtLcl => debug!(seq, "catchup at LCL, hash correct"),
            Continuity::ValidNext => {}
        }
        if !continuity.should_apply() {
            return Ok(true);
        }

        let tx_set = self.tx_sets.resolve(seq, &lcl.hash)?;
        debug!(seq, txs = tx_set.len(), "ledger has transactions");

        let actual = tx_set_contents_hash(&tx_set);
        if actual != header.tx_set_hash() {
            self.metrics.record_failure();
            return Err(ReplayError::TxSetHashMismatch {
                seq,
                actual,
                expected: header.tx_set_hash(),
            }
            .into());
        }

        let data = LedgerCloseData::new(seq, tx_set, header.consensus_value().clone());
        let produced = self.sink.close_ledger(&data).map_err(|e| {
            self.metrics.record_failure();
            StepError::from_sink(seq, e)
        })?;

        if produced.hash != header.hash {
            self.metrics.record_failure();
            return Err(ReplayError::ProducedHashMismatch {
                seq,
                expected: header.hash,
                produced_seq: produced.sequence(),
                produced: produced.hash,
            }
            .into());
        }

        self.metrics.record_success();
        debug!(ledger = %header.abbrev(), "applied ledger");
        self.state.last_applied = header;
        Ok(true)
    }
}
