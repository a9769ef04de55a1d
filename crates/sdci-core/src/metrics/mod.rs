use std::{sync::Arc, time::Duration};

/// How a started run concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Timeout,
}

impl RunOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            RunOutcome::Finished => "finished",
            RunOutcome::Timeout => "timeout",
        }
    }
}

/// Why a trigger was turned away before anything ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotFound,
    Busy,
}

impl RejectReason {
    pub fn as_label(&self) -> &'static str {
        match self {
            RejectReason::NotFound => "not_found",
            RejectReason::Busy => "busy",
        }
    }
}

/// Sink for execution metrics.
///
/// Implementations must be cheap; they are called inline on the run path.
pub trait MetricsBackend: Send + Sync + 'static {
    fn record_run_started(&self, task: &str);
    fn record_run_completed(&self, task: &str, outcome: RunOutcome, duration: Duration);
    fn record_spawn_failed(&self, task: &str);
    fn record_rejected(&self, reason: RejectReason);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

/// Backend that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    fn record_run_started(&self, _task: &str) {}
    fn record_run_completed(&self, _task: &str, _outcome: RunOutcome, _duration: Duration) {}
    fn record_spawn_failed(&self, _task: &str) {}
    fn record_rejected(&self, _reason: RejectReason) {}
}
