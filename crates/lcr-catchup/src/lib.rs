//! Ledger chain replay for validator catch-up.
//!
//! Replays a downloaded, checkpoint-aligned run of historical ledgers into a
//! [`LedgerApplicationSink`](lcr_ledger::LedgerApplicationSink), one ledger per
//! scheduler step, while enforcing hash-chain continuity with the sink's
//! last-closed ledger.
//!
//! # Components
//!
//! - [`TxSetResolver`]: one-record look-ahead over the sparse transaction
//!   stream; ledgers without an archived set get an empty set anchored to the LCL
//! - [`ContinuityValidator`]: classifies each archived header against the LCL
//! - [`LedgerChainReplayer`]: checkpoint cursor, file rotation, and the
//!   `step()` state machine driven by an external scheduler
//! - [`HistoryPublisher`]: closes ledgers on a sink and archives them per
//!   checkpoint, producing input the replayer consumes
//!
//! # Error channels
//!
//! Chain and filesystem errors end the work with [`StepState::Failure`].
//! Invariant violations raised by the sink are returned as
//! `Err(InvariantViolation)` and must halt the caller.

pub mod config;
pub mod continuity;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod publish;
pub mod replayer;
pub mod resolver;
pub mod work;

pub use config::ReplayConfig;
pub use continuity::{Continuity, ContinuityValidator};
pub use error::{ConfigError, InvariantViolation, PublishError, ReplayError, ReplayErrorKind};
pub use metrics::{ApplyMetrics, ApplyMetricsSnapshot};
pub use progress::{format_progress, LogProgress, ProgressReporter};
pub use publish::HistoryPublisher;
pub use replayer::LedgerChainReplayer;
pub use resolver::{TxSetResolver, TxSetSource};
pub use work::{StepReport, StepState, WorkState};
