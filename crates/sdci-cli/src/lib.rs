//! Client side of the sdci task-execution service.

mod client;
pub use client::{SdciClient, normalize_server};

mod error;
pub use error::ClientError;
