use std::{sync::Arc, time::Duration};

use sdci_model::{DEFAULT_TIMEOUT_MS, RunRecord};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    lock::ExecutionGuard,
    metrics::{MetricsHandle, NoOpMetrics},
    resolve::Task,
    state::StatusStore,
};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("run aborted: {0}")]
    Aborted(String),
}

/// Output lines a run may queue for a consumer that is not keeping up.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 4096;

/// Shared collaborators handed to a runner for one launch.
#[derive(Clone)]
pub struct RunContext {
    pub store: StatusStore,
    pub metrics: MetricsHandle,
    /// Wall-clock budget measured from spawn.
    pub timeout: Duration,
    /// Queued lines beyond this are dropped, never waited on.
    pub output_capacity: usize,
}

impl RunContext {
    pub fn new(store: StatusStore) -> Self {
        Self {
            store,
            metrics: Arc::new(NoOpMetrics),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_capacity(mut self, lines: usize) -> Self {
        self.output_capacity = lines;
        self
    }
}

/// Launches one task while holding the execution lock.
///
/// A runner owns every side effect of the run (status records, lock release) and must keep
/// going when the [`RunStream`] consumer goes away.
pub trait Runner: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Spawn `task` and return its live output.
    ///
    /// Must be called inside a tokio runtime. `guard` is dropped once the final record is
    /// published, or immediately if the spawn fails.
    fn launch(
        &self,
        task: Task,
        args: Vec<String>,
        guard: ExecutionGuard,
        ctx: RunContext,
    ) -> Result<RunStream, RunnerError>;
}

/// Live output of a run plus a handle on its completion.
#[derive(Debug)]
pub struct RunStream {
    pid: Option<u32>,
    output: mpsc::Receiver<String>,
    completion: RunCompletion,
}

impl RunStream {
    pub fn new(
        pid: Option<u32>,
        output: mpsc::Receiver<String>,
        done: JoinHandle<RunRecord>,
    ) -> Self {
        Self {
            pid,
            output,
            completion: RunCompletion { done },
        }
    }

    #[inline]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Split into the raw output receiver and the completion handle.
    ///
    /// Dropping either half leaves the run untouched.
    pub fn into_parts(self) -> (mpsc::Receiver<String>, RunCompletion) {
        (self.output, self.completion)
    }

    /// Drain every chunk, then wait for the final record.
    pub async fn collect(mut self) -> Result<(Vec<String>, RunRecord), RunnerError> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.output.recv().await {
            chunks.push(chunk);
        }
        let record = self.completion.wait().await?;
        Ok((chunks, record))
    }
}

/// Resolves to the final [`RunRecord`] once the run is over.
#[derive(Debug)]
pub struct RunCompletion {
    done: JoinHandle<RunRecord>,
}

impl RunCompletion {
    pub async fn wait(self) -> Result<RunRecord, RunnerError> {
        self.done
            .await
            .map_err(|e| RunnerError::Aborted(e.to_string()))
    }
}
