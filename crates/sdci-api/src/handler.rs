use async_trait::async_trait;
use sdci_core::RunStream;
use sdci_model::RunRecord;

use crate::error::ApiError;

/// Task execution API handler.
///
/// This trait abstracts the backend implementation, allowing users to:
/// - Use the provided `ServiceApiAdapter`
/// - Implement custom handlers with additional logic (auditing, per-task policies, etc.)
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Start a run of `task` and return its live output.
    async fn trigger(&self, task: &str, args: Vec<String>) -> Result<RunStream, ApiError>;

    /// Latest run record of `task`.
    async fn status(&self, task: &str) -> Result<RunRecord, ApiError>;
}
