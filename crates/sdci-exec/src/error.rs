use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("missing interpreter")]
    MissingInterpreter,
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

pub type ExecResult<T> = Result<T, ExecError>;
