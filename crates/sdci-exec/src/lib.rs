mod error;
pub use error::{ExecError, ExecResult};

pub mod marker;

pub mod proc;
pub use proc::{ProcConfig, ProcessHandle, ProcessOutput};

mod engine;
pub use engine::ScriptRunner;

mod util;
