use std::sync::Arc;

use async_trait::async_trait;
use sdci_core::{CoreError, RunStream, TaskService};
use sdci_model::RunRecord;

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that bridges `TaskService` to `ApiHandler`.
///
/// Maps core errors per endpoint: an unknown task is 422 on trigger but 404 on status.
pub struct ServiceApiAdapter {
    service: Arc<TaskService>,
}

impl ServiceApiAdapter {
    pub fn new(service: Arc<TaskService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<TaskService> {
        &self.service
    }
}

#[async_trait]
impl ApiHandler for ServiceApiAdapter {
    async fn trigger(&self, task: &str, args: Vec<String>) -> Result<RunStream, ApiError> {
        self.service.trigger(task, args).map_err(|e| match e {
            CoreError::TaskNotFound(msg) => ApiError::UnprocessableTask(msg),
            CoreError::TaskBusy => ApiError::Busy(CoreError::TaskBusy.to_string()),
            other => ApiError::Internal(other.to_string()),
        })
    }

    async fn status(&self, task: &str) -> Result<RunRecord, ApiError> {
        self.service.status(task).map_err(|e| match e {
            CoreError::TaskNotFound(msg) => ApiError::TaskNotFound(msg),
            other => ApiError::Internal(other.to_string()),
        })
    }
}
