use serde::{Deserialize, Serialize};

/// Lifecycle phase of the latest run of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    /// Never run (or no record kept).
    #[default]
    Stopped,
    /// Subprocess spawned and not yet concluded.
    Running,
    /// Subprocess exited on its own before the deadline.
    Finished,
    /// Subprocess was force-terminated after the deadline.
    Timeout,
}

impl RunPhase {
    /// Returns `true` for phases a run never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Finished | RunPhase::Timeout)
    }

    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Stopped => "stopped",
            RunPhase::Running => "running",
            RunPhase::Finished => "finished",
            RunPhase::Timeout => "timeout",
        }
    }
}
