mod task_name;
pub use task_name::{TaskName, TaskNameError};

mod run_phase;
pub use run_phase::RunPhase;

mod run_record;
pub use run_record::RunRecord;

mod trigger;
pub use trigger::TriggerRequest;

/// Timeout value in milliseconds.
pub type TimeoutMs = u64;

/// Wall-clock budget of a single run, measured from spawn.
pub const DEFAULT_TIMEOUT_MS: TimeoutMs = 12_000;
