use lcr_types::LedgerSeq;
use tracing::info;

/// Receives the replayer's status after every step.
pub trait ProgressReporter: Send + Sync {
    fn update(&self, status: &str);
}

/// Reports progress through `tracing`.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn update(&self, status: &str) {
        info!(target: "catchup", "{status}");
    }
}

/// Status line shown while a replay is running.
pub fn format_progress(first: LedgerSeq, last: LedgerSeq, current: LedgerSeq) -> String {
    format!("applying checkpoint {first}..{last}, currently {current}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line() {
        assert_eq!(
            format_progress(70, 140, 127),
            "applying checkpoint 70..140, currently 127"
        );
    }
}
