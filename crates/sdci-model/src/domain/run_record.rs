use serde::{Deserialize, Serialize};

use crate::RunPhase;

/// Latest known execution state of a task.
///
/// Serialized as `{"pid": .., "exit_code": .., "status": ..}`; absent values are `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunRecord {
    /// OS process id of the current or most recent run.
    #[serde(default)]
    pub pid: Option<u32>,
    /// Exit code; absent while running.
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub status: RunPhase,
}

impl RunRecord {
    /// Record for a task that was never run.
    pub const fn stopped() -> Self {
        Self {
            pid: None,
            exit_code: None,
            status: RunPhase::Stopped,
        }
    }

    /// Record published the instant a subprocess is spawned.
    pub const fn running(pid: Option<u32>) -> Self {
        Self {
            pid,
            exit_code: None,
            status: RunPhase::Running,
        }
    }

    /// Record published when a run concludes.
    pub const fn concluded(pid: Option<u32>, exit_code: Option<i32>, status: RunPhase) -> Self {
        Self {
            pid,
            exit_code,
            status,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.status == RunPhase::Running
    }
}
