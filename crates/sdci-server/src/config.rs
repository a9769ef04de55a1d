use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use clap::Parser;
use sdci_core::DEFAULT_OUTPUT_CAPACITY;
use sdci_model::{DEFAULT_TIMEOUT_MS, TimeoutMs};
use sdci_observe::{LoggerConfig, LoggerFormat};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SERVER TOKEN NOT FOUND - Please provide a token via SDCI_SERVER_TOKEN env var")]
    MissingToken,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("interpreter must not be empty")]
    EmptyInterpreter,
    #[error("output buffer must hold at least one line")]
    ZeroOutputBuffer,
}

/// Remote task-execution server.
#[derive(Debug, Clone, Parser)]
#[command(name = "sdci-server", version, about)]
pub struct ServerConfig {
    /// Bearer secret every request must present.
    #[arg(long, env = "SDCI_SERVER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, env = "SDCI_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "SDCI_PORT", default_value_t = 8842)]
    pub port: u16,

    /// Directory holding one `<task>.sh` per task.
    #[arg(long, env = "SDCI_TASKS_DIR", default_value = "./tasks")]
    pub tasks_dir: PathBuf,

    /// Program task scripts are handed to.
    #[arg(long, env = "SDCI_INTERPRETER", default_value = "bash")]
    pub interpreter: String,

    /// Hard wall-clock limit of one run, from spawn.
    #[arg(long, env = "SDCI_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: TimeoutMs,

    /// Output lines queued for a slow client before further lines are dropped.
    #[arg(long, env = "SDCI_OUTPUT_BUFFER", default_value_t = DEFAULT_OUTPUT_CAPACITY)]
    pub output_buffer: usize,

    /// Level for sdci targets (`debug`), or a full filter directive.
    #[arg(long, env = "SDCI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// text | json | journald
    #[arg(long, env = "SDCI_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// Do not mount `GET /metrics`.
    #[arg(long, env = "SDCI_DISABLE_METRICS")]
    pub disable_metrics: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(ConfigError::MissingToken);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.interpreter.trim().is_empty() {
            return Err(ConfigError::EmptyInterpreter);
        }
        if self.output_buffer == 0 {
            return Err(ConfigError::ZeroOutputBuffer);
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn logger(&self) -> LoggerConfig {
        LoggerConfig::new(self.log_format, self.log_level.clone())
    }
}
