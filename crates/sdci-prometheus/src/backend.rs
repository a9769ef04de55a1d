use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use sdci_core::{MetricsBackend, RejectReason, RunOutcome};

/// Buckets sized around the default 12 s run budget.
const DURATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 12.0, 15.0, 30.0, 60.0];

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    runs_started: IntCounterVec,
    runs_completed: IntCounterVec,
    run_duration: HistogramVec,
    spawn_failures: IntCounterVec,
    rejected: IntCounterVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let runs_started = IntCounterVec::new(
            Opts::new("sdci_runs_started_total", "Task runs spawned"),
            &["task"],
        )?;
        let runs_completed = IntCounterVec::new(
            Opts::new("sdci_runs_completed_total", "Task runs concluded"),
            &["task", "outcome"],
        )?;
        let run_duration = HistogramVec::new(
            HistogramOpts::new("sdci_run_duration_seconds", "Wall-clock run duration")
                .buckets(DURATION_BUCKETS.to_vec()),
            &["outcome"],
        )?;
        let spawn_failures = IntCounterVec::new(
            Opts::new("sdci_spawn_failures_total", "Task scripts that failed to spawn"),
            &["task"],
        )?;
        let rejected = IntCounterVec::new(
            Opts::new("sdci_triggers_rejected_total", "Triggers turned away before running"),
            &["reason"],
        )?;

        registry.register(Box::new(runs_started.clone()))?;
        registry.register(Box::new(runs_completed.clone()))?;
        registry.register(Box::new(run_duration.clone()))?;
        registry.register(Box::new(spawn_failures.clone()))?;
        registry.register(Box::new(rejected.clone()))?;

        Ok(Self {
            registry,
            runs_started,
            runs_completed,
            run_duration,
            spawn_failures,
            rejected,
        })
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_run_started(&self, task: &str) {
        self.runs_started.with_label_values(&[task]).inc();
    }

    fn record_run_completed(&self, task: &str, outcome: RunOutcome, duration: Duration) {
        self.runs_completed
            .with_label_values(&[task, outcome.as_label()])
            .inc();
        self.run_duration
            .with_label_values(&[outcome.as_label()])
            .observe(duration.as_secs_f64());
    }

    fn record_spawn_failed(&self, task: &str) {
        self.spawn_failures.with_label_values(&[task]).inc();
    }

    fn record_rejected(&self, reason: RejectReason) {
        self.rejected.with_label_values(&[reason.as_label()]).inc();
    }
}
