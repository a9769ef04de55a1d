use sdci_model::TaskNameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid task name: {0}")]
    InvalidTask(#[from] TaskNameError),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task busy: {0}")]
    Busy(String),

    #[error("server answered {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}
