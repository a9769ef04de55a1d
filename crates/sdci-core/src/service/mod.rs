use std::{sync::Arc, time::Duration};

use sdci_model::{DEFAULT_TIMEOUT_MS, RunRecord};
use tracing::{debug, info, instrument};

use crate::{
    error::CoreError,
    lock::ExecutionLock,
    metrics::{MetricsHandle, NoOpMetrics, RejectReason},
    resolve::TaskResolver,
    runner::{DEFAULT_OUTPUT_CAPACITY, RunContext, RunStream, Runner},
    state::StatusStore,
};

/// Owned coordination object shared by the trigger and status handlers.
///
/// Holds the one execution lock and the one status store for the lifetime of the server.
pub struct TaskService {
    resolver: TaskResolver,
    lock: ExecutionLock,
    store: StatusStore,
    runner: Arc<dyn Runner>,
    metrics: MetricsHandle,
    timeout: Duration,
    output_capacity: usize,
}

impl TaskService {
    pub fn new(resolver: TaskResolver, runner: Arc<dyn Runner>) -> Self {
        Self {
            resolver,
            lock: ExecutionLock::new(),
            store: StatusStore::new(),
            runner,
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

    /// Lines a run may queue for a slow reader before it starts dropping output.
    pub fn with_output_capacity(mut self, lines: usize) -> Self {
        self.output_capacity = lines;
        self
    }

    /// Resolve `name`, take the lock without waiting and launch the run.
    ///
    /// Fails with [`CoreError::TaskNotFound`] before the lock is touched, and with
    /// [`CoreError::TaskBusy`] if another run is in progress.
    #[instrument(
        level = "debug",
        skip(self, args),
        fields(task = %name, runner = self.runner.name())
    )]
    pub fn trigger(&self, name: &str, args: Vec<String>) -> Result<RunStream, CoreError> {
        let task = self.resolver.resolve(name).inspect_err(|_| {
            self.metrics.record_rejected(RejectReason::NotFound);
        })?;

        let guard = self.lock.try_acquire().inspect_err(|_| {
            debug!(target: "sdci.core.service", "rejected: another run holds the lock");
            self.metrics.record_rejected(RejectReason::Busy);
        })?;

        info!(target: "sdci.core.service", task = %task.name, "run command");
        let stream = self.runner.launch(task, args, guard, self.context())?;
        Ok(stream)
    }

    /// Latest record of `name`; `STOPPED` if it never ran. Never waits on the lock.
    pub fn status(&self, name: &str) -> Result<RunRecord, CoreError> {
        let task = self.resolver.resolve(name)?;
        Ok(self.store.get(task.name.as_str()))
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.lock.is_locked()
    }

    fn context(&self) -> RunContext {
        RunContext::new(self.store.clone())
            .with_metrics(Arc::clone(&self.metrics))
            .with_timeout(self.timeout)
            .with_output_capacity(self.output_capacity)
    }
}
