pub mod error;
pub use error::CoreError;

pub mod lock;
pub use lock::{ExecutionGuard, ExecutionLock};

pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoOpMetrics, RejectReason, RunOutcome};

pub mod resolve;
pub use resolve::{Task, TaskResolver};

pub mod runner;
pub use runner::{
    DEFAULT_OUTPUT_CAPACITY, RunCompletion, RunContext, RunStream, Runner, RunnerError,
};

mod state;
pub use state::StatusStore;

pub mod service;
pub use service::TaskService;
