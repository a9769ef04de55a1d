//! Prometheus metrics backend for the sdci execution engine.
//!
//! [`PrometheusMetrics`] implements [`sdci_core::MetricsBackend`] and owns its own [`Registry`].
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use sdci_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: sdci_core::MetricsHandle = Arc::new(metrics.clone());
//! # let _ = handle;
//!
//! let exposition = metrics.render()?;
//! assert!(exposition.is_empty() || exposition.contains("sdci_"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `sdci_runs_started_total{task}` - Counter
//! - `sdci_runs_completed_total{task, outcome}` - Counter
//! - `sdci_run_duration_seconds{outcome}` - Histogram
//! - `sdci_spawn_failures_total{task}` - Counter
//! - `sdci_triggers_rejected_total{reason}` - Counter

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
