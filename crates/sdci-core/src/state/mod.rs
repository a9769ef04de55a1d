use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use sdci_model::{RunRecord, TaskName};

/// In-memory map of task name to the latest run record.
///
/// Keys appear lazily on the first run of a task; a missing key reads as `STOPPED`.
/// Only the execution engine writes, and it does so while holding the execution lock.
#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<RwLock<HashMap<TaskName, RunRecord>>>,
}

impl StatusStore {
    /// Create empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the record of `task` in full.
    pub fn publish(&self, task: &TaskName, record: RunRecord) {
        self.write().insert(task.clone(), record);
    }

    /// Latest record of `task`, or the `STOPPED` record if it never ran.
    pub fn get(&self, task: &str) -> RunRecord {
        self.read()
            .get(task)
            .copied()
            .unwrap_or_else(RunRecord::stopped)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskName, RunRecord>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskName, RunRecord>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
