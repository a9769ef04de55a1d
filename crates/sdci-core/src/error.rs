use thiserror::Error;

use crate::runner::RunnerError;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown or unresolvable task; nothing shared was touched.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// Another run holds the execution lock.
    #[error("command already running")]
    TaskBusy,

    #[error(transparent)]
    Runner(#[from] RunnerError),
}
